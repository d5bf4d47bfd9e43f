//! Ordered (pattern, generator) rules.

use crate::context::{GenerationContext, Signal};
use crate::error::PatternError;
use crate::pattern::Pattern;
use std::fmt;
use std::sync::Arc;

/// Generator body bound to a rule.
pub type GeneratorFn = Arc<dyn Fn(&mut GenerationContext) -> Result<(), Signal> + Send + Sync>;

#[derive(Clone)]
pub struct Rule {
    pattern: Pattern,
    generator: GeneratorFn,
}

impl Rule {
    pub fn new<F>(pattern: Pattern, generator: F) -> Self
    where
        F: Fn(&mut GenerationContext) -> Result<(), Signal> + Send + Sync + 'static,
    {
        Self::from_fn(pattern, Arc::new(generator))
    }

    pub fn from_fn(pattern: Pattern, generator: GeneratorFn) -> Self {
        Self { pattern, generator }
    }

    pub fn compile<F>(glob: &str, generator: F) -> Result<Self, PatternError>
    where
        F: Fn(&mut GenerationContext) -> Result<(), Signal> + Send + Sync + 'static,
    {
        Ok(Self::new(Pattern::compile(glob)?, generator))
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn generate(&self, ctx: &mut GenerationContext) -> Result<(), Signal> {
        (self.generator)(ctx)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern.source())
            .finish_non_exhaustive()
    }
}

/// Rules in declaration order. Earlier rules win.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Rules whose pattern matches `name`, in order, with their captures.
    pub fn matching<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a Rule, Vec<String>)> + 'a {
        self.rules
            .iter()
            .filter_map(move |rule| rule.pattern.captures(name).map(|caps| (rule, caps)))
    }

    pub fn any_match(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern.is_match(name))
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
