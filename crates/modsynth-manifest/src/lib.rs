//! # modsynth-manifest
//!
//! Declarative loaders. A TOML manifest lists loaders, each with an
//! optional `match_only` allow-list and an ordered list of rules; every rule
//! pairs a glob with an action and fragment text. Loading a manifest
//! compiles every pattern and fragment up front, so a manifest that loads
//! cannot fail later on malformed syntax.
//!
//! ```toml
//! [registry]
//! policy = "first_writer_wins"
//!
//! [[loader]]
//! id = "schema"
//! match_only = "App::Schema::**"
//!
//! [[loader.rule]]
//! pattern = "App::Schema::*"
//! fragments = ["sub table {{ '{1}' }}"]
//! ```

pub mod document;
pub mod fragment;

pub use document::{LoaderDecl, Manifest, OneOrMany, RegistrySection, RuleAction, RuleDecl};
pub use fragment::{FragmentError, FragmentTemplate};

use modsynth_kernel::{
    BuildError, GenerationContext, HostChain, Loader, Pattern, PatternError,
    ProvenanceRegistry, Rule, Signal,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const INLINE_SOURCE: &str = "<inline>";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("duplicate loader id `{0}`")]
    DuplicateLoaderId(String),

    #[error("loader `{loader}`, rule {rule}: {source}")]
    Pattern {
        loader: String,
        rule: usize,
        #[source]
        source: PatternError,
    },

    #[error("loader `{loader}`, rule {rule}: {source}")]
    Fragment {
        loader: String,
        rule: usize,
        #[source]
        source: FragmentError,
    },

    #[error("loader `{loader}`, rule {rule}: `fail` rules need a message")]
    MissingFailMessage { loader: String, rule: usize },

    #[error("loader `{loader}`, rule {rule}: `message` is only read by `fail` rules, not `{action}`")]
    UnexpectedMessage {
        loader: String,
        rule: usize,
        action: RuleAction,
    },

    #[error("loader `{loader}`: {source}")]
    Build {
        loader: String,
        #[source]
        source: BuildError,
    },
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ManifestError> {
        Self::parse(text, INLINE_SOURCE)
    }

    fn parse(text: &str, path: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(text).map_err(|source| ManifestError::ParseToml {
            path: path.to_string(),
            source,
        })?;
        manifest.compile_loaders(&Arc::new(ProvenanceRegistry::default()))?;
        debug!(path, loaders = manifest.loaders.len(), "manifest loaded");
        Ok(manifest)
    }

    /// A fresh registry honoring `[registry] policy`.
    pub fn new_registry(&self) -> Arc<ProvenanceRegistry> {
        Arc::new(ProvenanceRegistry::new(self.registry.policy))
    }

    /// Loader ids in declaration order; unnamed loaders are `loader.<index>`.
    pub fn loader_ids(&self) -> Vec<String> {
        self.loaders
            .iter()
            .enumerate()
            .map(|(index, decl)| loader_id(index, decl))
            .collect()
    }

    pub fn compile_loaders(
        &self,
        registry: &Arc<ProvenanceRegistry>,
    ) -> Result<Vec<Loader>, ManifestError> {
        let mut seen = BTreeSet::new();
        let mut loaders = Vec::with_capacity(self.loaders.len());
        for (index, decl) in self.loaders.iter().enumerate() {
            let id = loader_id(index, decl);
            if !seen.insert(id.clone()) {
                return Err(ManifestError::DuplicateLoaderId(id));
            }
            loaders.push(self.compile_loader(&id, decl, registry)?);
        }
        Ok(loaders)
    }

    /// Compile every loader and register each into `host`, in order.
    pub fn install(
        &self,
        host: &HostChain,
        registry: &Arc<ProvenanceRegistry>,
    ) -> Result<Vec<Arc<Loader>>, ManifestError> {
        let loaders: Vec<Arc<Loader>> = self
            .compile_loaders(registry)?
            .into_iter()
            .map(Arc::new)
            .collect();
        for loader in &loaders {
            host.register(loader.clone());
        }
        Ok(loaders)
    }

    fn compile_loader(
        &self,
        id: &str,
        decl: &LoaderDecl,
        registry: &Arc<ProvenanceRegistry>,
    ) -> Result<Loader, ManifestError> {
        let mut builder = Loader::builder()
            .id(id)
            .registry(registry.clone())
            .fragment_policy(decl.fragment_policy)
            .emit_style(self.emit.clone());
        if let Some(match_only) = &decl.match_only {
            builder = builder.match_only_any(match_only.globs().iter().cloned());
        }
        for (index, rule) in decl.rules.iter().enumerate() {
            builder = builder.compiled_rule(compile_rule(id, index, rule)?);
        }
        builder.build().map_err(|source| ManifestError::Build {
            loader: id.to_string(),
            source,
        })
    }
}

fn loader_id(index: usize, decl: &LoaderDecl) -> String {
    decl.id
        .clone()
        .unwrap_or_else(|| format!("loader.{index}"))
}

fn compile_rule(loader: &str, index: usize, decl: &RuleDecl) -> Result<Rule, ManifestError> {
    let pattern = Pattern::compile(&decl.pattern).map_err(|source| ManifestError::Pattern {
        loader: loader.to_string(),
        rule: index,
        source,
    })?;
    let fragment_error = |source| ManifestError::Fragment {
        loader: loader.to_string(),
        rule: index,
        source,
    };
    let check_range = |template: &FragmentTemplate| {
        let index = template.max_capture();
        if index > pattern.wildcard_count() {
            return Err(fragment_error(FragmentError::CaptureOutOfRange {
                index,
                available: pattern.wildcard_count(),
                pattern: decl.pattern.clone(),
            }));
        }
        Ok(())
    };

    let mut fragments = Vec::with_capacity(decl.fragments.len());
    for text in &decl.fragments {
        let template = FragmentTemplate::parse(text).map_err(fragment_error)?;
        check_range(&template)?;
        fragments.push(template);
    }
    let message = match (decl.action, &decl.message) {
        (RuleAction::Fail, None) => {
            return Err(ManifestError::MissingFailMessage {
                loader: loader.to_string(),
                rule: index,
            });
        }
        (RuleAction::Fail, Some(text)) => {
            let template = FragmentTemplate::parse(text).map_err(fragment_error)?;
            check_range(&template)?;
            Some(template)
        }
        (action, Some(_)) => {
            return Err(ManifestError::UnexpectedMessage {
                loader: loader.to_string(),
                rule: index,
                action,
            });
        }
        (_, None) => None,
    };

    let action = decl.action;
    Ok(Rule::new(pattern, move |ctx: &mut GenerationContext| {
        if action == RuleAction::Fail {
            let text = message
                .as_ref()
                .map(|template| template.render(ctx))
                .unwrap_or_default();
            return Err(Signal::fail(text));
        }
        let rendered: Vec<String> = fragments.iter().map(|t| t.render(ctx)).collect();
        ctx.emit_all(rendered);
        match action {
            RuleAction::Next => Err(Signal::Next),
            RuleAction::Stop => Err(Signal::Stop),
            RuleAction::Emit | RuleAction::Fail => Ok(()),
        }
    }))
}
