//! Glob patterns over `::`-delimited module names.
//!
//! A pattern is a sequence of segment tokens separated by [`DELIMITER`]:
//!
//! ```text
//! Some::**::Class      `**` absorbs zero or more whole segments
//! Some::*::Class       `*` absorbs exactly one segment
//! Some::Foo*::Class    `*` inside a segment absorbs part of one segment
//! ```
//!
//! Patterns compile to one anchored regular expression. Each token owns its
//! leading delimiter and the expression runs against the name with a
//! delimiter prepended, so a `**` that absorbs nothing also absorbs no
//! delimiter, wherever it sits in the pattern.
//!
//! Captures are positional, one per wildcard, left to right. A `**` capture
//! joins its segments back together with `::`; an empty `**` captures `""`.

use crate::error::PatternError;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Namespace delimiter between segments.
pub const DELIMITER: &str = "::";

const SEGMENT_WILDCARD: &str = "*";
const MULTI_SEGMENT_WILDCARD: &str = "**";

const ONE_SEGMENT: &str = "::([^:]+)";
const ANY_SEGMENTS: &str = "(?:::([^:]+(?:::[^:]+)*))?";
const PARTIAL_RUN: &str = "([^:]*)";

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Exact, case-sensitive segment text.
    Literal(String),
    /// `*`: exactly one segment.
    Segment,
    /// `**`: zero or more consecutive segments.
    Segments,
    /// Literal text interleaved with `*`, matching within one segment.
    ///
    /// `Foo*Bar` is stored as `["Foo", "Bar"]`; each gap is one capture.
    Partial(Vec<String>),
}

impl Token {
    fn captures(&self) -> usize {
        match self {
            Token::Literal(_) => 0,
            Token::Segment | Token::Segments => 1,
            Token::Partial(pieces) => pieces.len().saturating_sub(1),
        }
    }

    fn push_regex(&self, out: &mut String) {
        match self {
            Token::Literal(text) => {
                out.push_str(DELIMITER);
                out.push_str(&regex::escape(text));
            }
            Token::Segment => out.push_str(ONE_SEGMENT),
            Token::Segments => out.push_str(ANY_SEGMENTS),
            Token::Partial(pieces) => {
                out.push_str(DELIMITER);
                for (idx, piece) in pieces.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(PARTIAL_RUN);
                    }
                    out.push_str(&regex::escape(piece));
                }
            }
        }
    }
}

/// A compiled glob.
///
/// Immutable once built; two patterns compiled from the same glob agree on
/// every input.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
    regex: Regex,
}

impl Pattern {
    pub fn compile(glob: &str) -> Result<Self, PatternError> {
        let tokens = parse_tokens(glob)?;
        let mut expr = String::from("^");
        for token in &tokens {
            token.push_regex(&mut expr);
        }
        expr.push('$');
        let regex = Regex::new(&expr).map_err(|source| PatternError::Regex {
            glob: glob.to_string(),
            source,
        })?;
        Ok(Self {
            source: glob.to_string(),
            tokens,
            regex,
        })
    }

    /// The glob this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of positional captures a successful match yields.
    pub fn wildcard_count(&self) -> usize {
        self.tokens.iter().map(Token::captures).sum()
    }

    /// Whether the pattern has no wildcards and so matches only itself.
    pub fn is_literal(&self) -> bool {
        self.wildcard_count() == 0
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(&delimited(name))
    }

    /// Match `name` and return its captures, or `None` when it does not match.
    pub fn captures(&self, name: &str) -> Option<Vec<String>> {
        let subject = delimited(name);
        let caps = self.regex.captures(&subject)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

fn parse_tokens(glob: &str) -> Result<Vec<Token>, PatternError> {
    if glob.is_empty() {
        return Err(PatternError::Empty);
    }
    glob.split(DELIMITER)
        .enumerate()
        .map(|(position, segment)| parse_segment(glob, position, segment))
        .collect()
}

fn parse_segment(glob: &str, position: usize, segment: &str) -> Result<Token, PatternError> {
    let invalid = |reason| PatternError::InvalidSegment {
        glob: glob.to_string(),
        segment: segment.to_string(),
        reason,
    };
    match segment {
        "" => Err(PatternError::EmptySegment {
            glob: glob.to_string(),
            position,
        }),
        SEGMENT_WILDCARD => Ok(Token::Segment),
        MULTI_SEGMENT_WILDCARD => Ok(Token::Segments),
        s if s.contains(MULTI_SEGMENT_WILDCARD) => Err(invalid("`**` must be a whole segment")),
        s if s.contains(':') => Err(invalid("stray `:` inside a segment")),
        s if s.contains('*') => Ok(Token::Partial(s.split('*').map(str::to_string).collect())),
        s => Ok(Token::Literal(s.to_string())),
    }
}

/// `A::B` becomes `::A::B`; the empty name stays empty (zero segments).
fn delimited(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!("{DELIMITER}{name}")
    }
}
