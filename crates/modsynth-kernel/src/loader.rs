//! Loader instances and rule dispatch.
//!
//! A [`Loader`] owns one ordered [`RuleSet`], an optional `match_only`
//! allow-list, and an identity used as the provenance key. Dispatch for a
//! request:
//!
//! 1. canonicalize the request to a `::` name;
//! 2. if `match_only` is set and no entry matches, decline;
//! 3. walk the rules in order; for each matching rule run its generator in a
//!    fresh [`GenerationContext`];
//! 4. `Next` moves on, `Stop` or a normal return finalizes the fragments,
//!    `Fail` aborts the dispatch;
//! 5. record provenance and emit the unit.
//!
//! When no rule finalizes, the loader declines with [`Dispatch::NotFound`],
//! leaving the name to whatever resolver comes next. Loaders do not cache;
//! asking twice generates twice.

use crate::canonical::canonicalize;
use crate::context::{GenerationContext, Signal};
use crate::emit::{EmitStyle, GeneratedUnit};
use crate::error::{BuildError, DispatchError};
use crate::host::HostChain;
use crate::pattern::{DELIMITER, Pattern};
use crate::registry::ProvenanceRegistry;
use crate::rule::{GeneratorFn, Rule, RuleSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identity of a loader instance, used as the provenance key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoaderId(String);

impl LoaderId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// A fresh random identity.
    pub fn generate() -> Self {
        Self(format!("loader-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Allow-list restricting which names a loader attempts at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOnly {
    patterns: Vec<Pattern>,
}

impl MatchOnly {
    /// Compile every glob; the first malformed one is reported by text.
    pub fn compile<I, S>(globs: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut patterns = Vec::new();
        for glob in globs {
            let glob = glob.into();
            match Pattern::compile(&glob) {
                Ok(pattern) => patterns.push(pattern),
                Err(source) => return Err(BuildError::MatchOnly { glob, source }),
            }
        }
        Ok(Self { patterns })
    }

    pub fn admits(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

/// What happens to fragments emitted by a generator that signals `Next`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentPolicy {
    /// Dropped; the unit reflects only the rule that finalized it.
    #[default]
    Discard,
    /// Carried into the next matching rule's context.
    Accumulate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Generated(GeneratedUnit),
    /// No opinion about this name.
    NotFound,
}

impl Dispatch {
    pub fn into_unit(self) -> Option<GeneratedUnit> {
        match self {
            Dispatch::Generated(unit) => Some(unit),
            Dispatch::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Dispatch::NotFound)
    }
}

pub struct Loader {
    id: LoaderId,
    rules: RuleSet,
    match_only: Option<MatchOnly>,
    fragment_policy: FragmentPolicy,
    emit_style: EmitStyle,
    registry: Arc<ProvenanceRegistry>,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("id", &self.id)
            .field("rules", &self.rules)
            .field("match_only", &self.match_only)
            .field("fragment_policy", &self.fragment_policy)
            .finish_non_exhaustive()
    }
}

impl Loader {
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::default()
    }

    pub fn id(&self) -> &LoaderId {
        &self.id
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn match_only(&self) -> Option<&MatchOnly> {
        self.match_only.as_ref()
    }

    pub fn fragment_policy(&self) -> FragmentPolicy {
        self.fragment_policy
    }

    pub fn emit_style(&self) -> &EmitStyle {
        &self.emit_style
    }

    pub fn registry(&self) -> &Arc<ProvenanceRegistry> {
        &self.registry
    }

    pub fn dispatch(&self, request: &str) -> Result<Dispatch, DispatchError> {
        let name = canonicalize(request);
        if !is_well_formed(&name) {
            debug!(loader = %self.id, request, "request has no usable name");
            return Ok(Dispatch::NotFound);
        }
        if !self.admits(&name) {
            debug!(loader = %self.id, %name, "name outside match_only");
            return Ok(Dispatch::NotFound);
        }

        let mut carried = Vec::new();
        for (rule, captures) in self.rules.matching(&name) {
            let pattern = rule.pattern().source();
            let mut ctx = GenerationContext::with_fragments(
                name.as_str(),
                captures,
                std::mem::take(&mut carried),
            );
            match rule.generate(&mut ctx) {
                Ok(()) => return self.finish(&name, pattern, ctx.into_fragments()),
                Err(Signal::Stop) => {
                    debug!(loader = %self.id, %name, pattern, "rule evaluation stopped");
                    return self.finish(&name, pattern, ctx.into_fragments());
                }
                Err(Signal::Next) => {
                    debug!(loader = %self.id, %name, pattern, "rule skipped");
                    if self.fragment_policy == FragmentPolicy::Accumulate {
                        carried = ctx.into_fragments();
                    }
                }
                Err(Signal::Fail(source)) => {
                    warn!(loader = %self.id, %name, pattern, error = %source, "generator failed");
                    return Err(DispatchError::Generator {
                        name: name.clone(),
                        pattern: pattern.to_string(),
                        source,
                    });
                }
            }
        }

        debug!(loader = %self.id, %name, "no rule produced a unit");
        Ok(Dispatch::NotFound)
    }

    /// Whether a dispatch for `request` would reach a generator.
    pub fn would_handle(&self, request: &str) -> bool {
        let name = canonicalize(request);
        is_well_formed(&name) && self.admits(&name) && self.rules.any_match(&name)
    }

    pub fn generated_by(&self, name: &str) -> Option<LoaderId> {
        self.registry.generated_by(&canonicalize(name))
    }

    pub fn was_generated(&self, name: &str) -> bool {
        self.registry.was_generated(&canonicalize(name))
    }

    /// Names this loader generated first, sorted.
    pub fn generated(&self) -> Vec<String> {
        self.registry.names_generated_by(&self.id)
    }

    fn admits(&self, name: &str) -> bool {
        self.match_only
            .as_ref()
            .is_none_or(|match_only| match_only.admits(name))
    }

    fn finish(
        &self,
        name: &str,
        pattern: &str,
        fragments: Vec<String>,
    ) -> Result<Dispatch, DispatchError> {
        self.registry.record(name, &self.id, pattern)?;
        info!(
            loader = %self.id,
            name,
            pattern,
            fragments = fragments.len(),
            "generated unit"
        );
        Ok(Dispatch::Generated(GeneratedUnit::emit(
            &self.emit_style,
            name,
            self.id.clone(),
            pattern,
            fragments,
        )))
    }
}

/// A name with at least one segment and no empty ones.
fn is_well_formed(name: &str) -> bool {
    !name.is_empty() && name.split(DELIMITER).all(|segment| !segment.is_empty())
}

enum RuleDecl {
    Glob(String, GeneratorFn),
    Compiled(Rule),
}

/// Declarative assembly of a [`Loader`].
///
/// Globs are compiled in [`LoaderBuilder::build`], so the first malformed
/// pattern is reported with its position.
#[derive(Default)]
pub struct LoaderBuilder {
    id: Option<LoaderId>,
    rules: Vec<RuleDecl>,
    match_only: Vec<String>,
    fragment_policy: FragmentPolicy,
    emit_style: EmitStyle,
    registry: Option<Arc<ProvenanceRegistry>>,
}

impl LoaderBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(LoaderId::new(id));
        self
    }

    pub fn rule<F>(mut self, glob: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&mut GenerationContext) -> Result<(), Signal> + Send + Sync + 'static,
    {
        self.rules.push(RuleDecl::Glob(glob.into(), Arc::new(generator)));
        self
    }

    pub fn compiled_rule(mut self, rule: Rule) -> Self {
        self.rules.push(RuleDecl::Compiled(rule));
        self
    }

    /// Add one allow-list entry. May be called repeatedly.
    pub fn match_only(mut self, glob: impl Into<String>) -> Self {
        self.match_only.push(glob.into());
        self
    }

    pub fn match_only_any<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_only.extend(globs.into_iter().map(Into::into));
        self
    }

    pub fn fragment_policy(mut self, policy: FragmentPolicy) -> Self {
        self.fragment_policy = policy;
        self
    }

    pub fn emit_style(mut self, style: EmitStyle) -> Self {
        self.emit_style = style;
        self
    }

    /// Record provenance here instead of in [`ProvenanceRegistry::global`].
    pub fn registry(mut self, registry: Arc<ProvenanceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<Loader, BuildError> {
        let mut rules = RuleSet::new();
        for (index, decl) in self.rules.into_iter().enumerate() {
            let rule = match decl {
                RuleDecl::Compiled(rule) => rule,
                RuleDecl::Glob(glob, generator) => match Pattern::compile(&glob) {
                    Ok(pattern) => Rule::from_fn(pattern, generator),
                    Err(source) => return Err(BuildError::Rule { index, glob, source }),
                },
            };
            rules.push(rule);
        }

        let match_only = if self.match_only.is_empty() {
            None
        } else {
            Some(MatchOnly::compile(self.match_only)?)
        };

        Ok(Loader {
            id: self.id.unwrap_or_else(LoaderId::generate),
            rules,
            match_only,
            fragment_policy: self.fragment_policy,
            emit_style: self.emit_style,
            registry: self.registry.unwrap_or_else(ProvenanceRegistry::global),
        })
    }

    /// Build and register into `host` in one step.
    pub fn install(self, host: &HostChain) -> Result<Arc<Loader>, BuildError> {
        let loader = Arc::new(self.build()?);
        host.register(loader.clone());
        Ok(loader)
    }
}
