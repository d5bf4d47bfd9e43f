//! Error types for pattern compilation, loader assembly, and dispatch.

use crate::loader::LoaderId;

/// A glob that the pattern grammar rejects.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The glob has no segments at all.
    #[error("empty pattern")]
    Empty,

    /// Two delimiters with nothing between them, or a leading/trailing delimiter.
    #[error("empty segment at position {position} in pattern `{glob}`")]
    EmptySegment { glob: String, position: usize },

    /// A segment the grammar cannot express.
    #[error("invalid segment `{segment}` in pattern `{glob}`: {reason}")]
    InvalidSegment {
        glob: String,
        segment: String,
        reason: &'static str,
    },

    /// The backing regular expression failed to build.
    #[error("pattern `{glob}` did not compile: {source}")]
    Regex {
        glob: String,
        #[source]
        source: regex::Error,
    },
}

/// A loader declaration that could not be assembled.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("rule {index} (`{glob}`): {source}")]
    Rule {
        index: usize,
        glob: String,
        #[source]
        source: PatternError,
    },

    #[error("match_only entry `{glob}`: {source}")]
    MatchOnly {
        glob: String,
        #[source]
        source: PatternError,
    },
}

/// Failure raised from inside a generator.
///
/// Wraps whatever the generator body produced; `Display` is the inner
/// message.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct GeneratorError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl GeneratorError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.0
    }
}

/// Provenance bookkeeping refused a record.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("`{name}` was already generated by {existing}; refusing record from {attempted}")]
    DuplicateGeneration {
        name: String,
        existing: LoaderId,
        attempted: LoaderId,
    },
}

/// A dispatch that matched a rule but could not produce a unit.
///
/// "No rule matched" is not an error; see [`crate::Dispatch::NotFound`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("generator for `{pattern}` failed on `{name}`: {source}")]
    Generator {
        name: String,
        pattern: String,
        #[source]
        source: GeneratorError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
