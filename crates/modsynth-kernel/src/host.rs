//! Host boundary: an ordered chain of module resolvers.
//!
//! [`HostChain`] stands in for a host's module-loading path. Resolvers are
//! consulted in registration order; the first one that returns a unit wins,
//! the first error aborts the request, and a request every resolver declines
//! is [`Resolution::NotHandled`].
//!
//! The chain may keep a table of resolved units keyed by request path, the
//! way hosts remember which modules are already loaded. Loaders themselves
//! never cache.

use crate::canonical::{DEFAULT_EXTENSION, canonicalize, to_request_path};
use crate::emit::GeneratedUnit;
use crate::error::DispatchError;
use crate::loader::{Dispatch, Loader};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unit(GeneratedUnit),
    NotHandled,
}

impl Resolution {
    pub fn into_unit(self) -> Option<GeneratedUnit> {
        match self {
            Resolution::Unit(unit) => Some(unit),
            Resolution::NotHandled => None,
        }
    }
}

/// One resolution mechanism in a host chain.
pub trait Resolver: Send + Sync {
    fn resolve(&self, request: &str) -> Result<Resolution, DispatchError>;
}

impl Resolver for Loader {
    fn resolve(&self, request: &str) -> Result<Resolution, DispatchError> {
        Ok(match self.dispatch(request)? {
            Dispatch::Generated(unit) => Resolution::Unit(unit),
            Dispatch::NotFound => Resolution::NotHandled,
        })
    }
}

pub struct HostChain {
    resolvers: RwLock<Vec<Arc<dyn Resolver>>>,
    loaded: Option<RwLock<BTreeMap<String, GeneratedUnit>>>,
    extension: String,
}

impl Default for HostChain {
    fn default() -> Self {
        Self::new()
    }
}

impl HostChain {
    pub fn new() -> Self {
        Self {
            resolvers: RwLock::default(),
            loaded: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// A chain that remembers resolved units and serves repeats from memory.
    pub fn with_cache() -> Self {
        Self {
            loaded: Some(RwLock::default()),
            ..Self::new()
        }
    }

    /// Extension used for request-path keys (`pm` unless changed).
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn register(&self, resolver: Arc<dyn Resolver>) {
        self.resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(resolver);
    }

    pub fn len(&self) -> usize {
        self.resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resolve(&self, request: &str) -> Result<Resolution, DispatchError> {
        let key = self.request_path(request);
        if let Some(unit) = self.cached(&key) {
            debug!(request, %key, "served from loaded table");
            return Ok(Resolution::Unit(unit));
        }

        // Snapshot so resolvers may re-enter the chain without deadlocking.
        let resolvers: Vec<Arc<dyn Resolver>> = self
            .resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for resolver in resolvers {
            if let Resolution::Unit(unit) = resolver.resolve(request)? {
                if let Some(loaded) = &self.loaded {
                    loaded
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .entry(key)
                        .or_insert_with(|| unit.clone());
                }
                return Ok(Resolution::Unit(unit));
            }
        }
        debug!(request, "no resolver handled request");
        Ok(Resolution::NotHandled)
    }

    pub fn is_loaded(&self, request: &str) -> bool {
        self.cached(&self.request_path(request)).is_some()
    }

    /// Request paths of every unit in the loaded table, sorted.
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.as_ref().map_or_else(Vec::new, |loaded| {
            loaded
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .keys()
                .cloned()
                .collect()
        })
    }

    fn request_path(&self, request: &str) -> String {
        to_request_path(&canonicalize(request), &self.extension)
    }

    fn cached(&self, key: &str) -> Option<GeneratedUnit> {
        self.loaded.as_ref().and_then(|loaded| {
            loaded
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned()
        })
    }
}
