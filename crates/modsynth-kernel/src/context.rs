//! Per-invocation generation context and generator control signals.
//!
//! A [`GenerationContext`] is built for exactly one generator call. The
//! generator reads the matched name and captures from it and appends source
//! fragments to it. The dispatcher consumes the fragments afterwards; the
//! context itself never outlives the call.
//!
//! Generators steer rule evaluation by returning a [`Signal`] through `Err`,
//! which lets helpers nested anywhere inside a generator bail out with `?`:
//!
//! ```text
//! Ok(())               fragments are final
//! Err(Signal::Next)    skip to the next matching rule
//! Err(Signal::Stop)    stop evaluating rules; fragments so far are final
//! Err(Signal::Fail(e)) abort the dispatch with `e`
//! ```

use crate::error::GeneratorError;
use crate::pattern::DELIMITER;

/// Non-local exit out of a generator.
#[derive(Debug)]
pub enum Signal {
    /// Continue with the next rule whose pattern matches the same name.
    Next,
    /// Stop rule evaluation and keep the fragments emitted so far.
    Stop,
    /// Abort the dispatch for this name.
    Fail(GeneratorError),
}

impl Signal {
    pub fn fail(message: impl Into<String>) -> Self {
        Signal::Fail(GeneratorError::msg(message))
    }
}

/// Any ordinary error escaping a generator through `?` is a failure.
impl<E> From<E> for Signal
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Signal::Fail(GeneratorError::new(error))
    }
}

/// Everything a generator can see and write during one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    name: String,
    captures: Vec<String>,
    fragments: Vec<String>,
}

impl GenerationContext {
    pub fn new(name: impl Into<String>, captures: Vec<String>) -> Self {
        Self::with_fragments(name, captures, Vec::new())
    }

    /// Start from fragments carried over by an earlier rule that skipped.
    pub(crate) fn with_fragments(
        name: impl Into<String>,
        captures: Vec<String>,
        fragments: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            captures,
            fragments,
        }
    }

    /// The canonical `::` name being generated.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split(DELIMITER)
    }

    /// Last segment of the name (`User` for `App::Schema::User`).
    pub fn leaf(&self) -> &str {
        self.segments().last().unwrap_or_default()
    }

    /// All captures, 0-based.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    /// Capture `n`, numbered from 1 like regex groups.
    pub fn capture(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|idx| self.captures.get(idx))
            .map(String::as_str)
    }

    pub fn emit(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    pub fn emit_all<I, S>(&mut self, fragments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments.extend(fragments.into_iter().map(Into::into));
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<String> {
        self.fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_column(table: &str) -> Result<String, std::io::Error> {
        if table == "users" {
            Ok("id".to_string())
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no table {table}"),
            ))
        }
    }

    fn nested_helper(ctx: &mut GenerationContext) -> Result<(), Signal> {
        if ctx.leaf() == "Skip" {
            return Err(Signal::Next);
        }
        let column = lookup_column(ctx.capture(1).unwrap_or_default())?;
        ctx.emit(format!("sub {column} {{ 1 }}"));
        Ok(())
    }

    #[test]
    fn captures_are_numbered_from_one() {
        let ctx = GenerationContext::new("A::B::C", vec!["B".to_string(), "C".to_string()]);
        assert_eq!(ctx.capture(0), None);
        assert_eq!(ctx.capture(1), Some("B"));
        assert_eq!(ctx.capture(2), Some("C"));
        assert_eq!(ctx.capture(3), None);
        assert_eq!(ctx.captures(), ["B".to_string(), "C".to_string()]);
        assert_eq!(ctx.leaf(), "C");
        assert_eq!(ctx.segments().collect::<Vec<_>>(), ["A", "B", "C"]);
    }

    #[test]
    fn emit_appends_in_order() {
        let mut ctx = GenerationContext::new("A", Vec::new());
        ctx.emit("one");
        ctx.emit_all(["two", "three"]);
        assert_eq!(ctx.into_fragments(), ["one", "two", "three"]);
    }

    #[test]
    fn signals_propagate_out_of_nested_helpers() {
        let mut ctx = GenerationContext::new("A::users", vec!["users".to_string()]);
        assert!(nested_helper(&mut ctx).is_ok());
        assert_eq!(ctx.fragments(), ["sub id { 1 }"]);

        let mut skip = GenerationContext::new("A::Skip", vec!["Skip".to_string()]);
        assert!(matches!(nested_helper(&mut skip), Err(Signal::Next)));

        let mut missing = GenerationContext::new("A::orders", vec!["orders".to_string()]);
        match nested_helper(&mut missing) {
            Err(Signal::Fail(err)) => assert_eq!(err.to_string(), "no table orders"),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
