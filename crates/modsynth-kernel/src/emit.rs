//! Assembly of synthesized units.
//!
//! A unit is a header line declaring the name, every fragment in collection
//! order, and a trailer line the host expects from a successfully loaded
//! unit. Fragments are opaque; nothing here checks their syntax.

use crate::loader::LoaderId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Cursor;

pub const NAME_PLACEHOLDER: &str = "{name}";
pub const DEFAULT_HEADER: &str = "package {name};";
pub const DEFAULT_TRAILER: &str = "1;";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EmitStyle {
    /// Header line; `{name}` is replaced by the unit name.
    pub header: String,
    pub trailer: String,
}

impl Default for EmitStyle {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            trailer: DEFAULT_TRAILER.to_string(),
        }
    }
}

impl EmitStyle {
    pub fn render(&self, name: &str, fragments: &[String]) -> String {
        let mut out = String::new();
        push_line(&mut out, &self.header.replace(NAME_PLACEHOLDER, name));
        for fragment in fragments {
            push_line(&mut out, fragment);
        }
        push_line(&mut out, &self.trailer);
        out
    }
}

fn push_line(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

/// A synthesized module, ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedUnit {
    name: String,
    loader: LoaderId,
    pattern: String,
    fragments: Vec<String>,
    source: String,
}

impl GeneratedUnit {
    pub fn emit(
        style: &EmitStyle,
        name: impl Into<String>,
        loader: LoaderId,
        pattern: impl Into<String>,
        fragments: Vec<String>,
    ) -> Self {
        let name = name.into();
        let source = style.render(&name, &fragments);
        Self {
            name,
            loader,
            pattern: pattern.into(),
            fragments,
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loader(&self) -> &LoaderId {
        &self.loader
    }

    /// Glob of the rule that finalized the unit.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    /// The source as an in-memory readable handle.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.source.as_bytes())
    }

    /// `sha256:<hex>` over the rendered source.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_bytes());
        format!("sha256:{:x}", hasher.finalize())
    }
}
