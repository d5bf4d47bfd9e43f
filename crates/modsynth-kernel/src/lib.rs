//! # modsynth kernel
//!
//! Synthesizes modules on demand. A host asks for a module by name; if a
//! loader's rules match the name, the bound generator emits source fragments
//! and the loader returns a complete unit. If nothing matches, the loader
//! declines and the host moves on.
//!
//! ## Architecture
//!
//! ```text
//! HostChain            ← ordered resolvers, optional loaded-unit table
//!     │
//! Loader               ← match_only filter, dispatch, provenance key
//!     │
//! RuleSet / Rule       ← (Pattern, generator) in declaration order
//!     │
//! GenerationContext    ← name, captures, fragment collector, Signal exits
//!     │
//! GeneratedUnit        ← header + fragments + trailer (EmitStyle)
//!
//! ProvenanceRegistry   ← name → LoaderId, first writer wins
//! ```

pub mod canonical;
pub mod context;
pub mod emit;
pub mod error;
pub mod host;
pub mod loader;
pub mod pattern;
pub mod registry;
pub mod rule;

pub use canonical::{canonicalize, to_request_path};
pub use context::{GenerationContext, Signal};
pub use emit::{EmitStyle, GeneratedUnit};
pub use error::{BuildError, DispatchError, GeneratorError, PatternError, RegistryError};
pub use host::{HostChain, Resolution, Resolver};
pub use loader::{Dispatch, FragmentPolicy, Loader, LoaderBuilder, LoaderId, MatchOnly};
pub use pattern::{DELIMITER, Pattern, Token};
pub use registry::{ProvenanceRecord, ProvenanceRegistry, RecordOutcome, RegistryPolicy};
pub use rule::{GeneratorFn, Rule, RuleSet};

/// Which loader generated `name`, according to the process-wide registry.
pub fn generated_by(name: &str) -> Option<LoaderId> {
    ProvenanceRegistry::global().generated_by(&canonicalize(name))
}

/// Whether `name` was generated, according to the process-wide registry.
pub fn was_generated(name: &str) -> bool {
    ProvenanceRegistry::global().was_generated(&canonicalize(name))
}
