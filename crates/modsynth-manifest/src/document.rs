//! Serde shape of a manifest file.

use modsynth_kernel::{EmitStyle, FragmentPolicy, RegistryPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub emit: EmitStyle,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default, rename = "loader")]
    pub loaders: Vec<LoaderDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    #[serde(default)]
    pub policy: RegistryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderDecl {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub match_only: Option<OneOrMany>,

    #[serde(default)]
    pub fragment_policy: FragmentPolicy,

    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleDecl>,
}

/// `match_only = "A::**"` or `match_only = ["A::**", "B::**"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn globs(&self) -> &[String] {
        match self {
            OneOrMany::One(glob) => std::slice::from_ref(glob),
            OneOrMany::Many(globs) => globs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDecl {
    pub pattern: String,

    #[serde(default)]
    pub action: RuleAction,

    #[serde(default)]
    pub fragments: Vec<String>,

    /// Failure message for `action = "fail"`.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Emit the fragments; they are final.
    #[default]
    Emit,
    /// Emit the fragments, then defer to the next matching rule.
    Next,
    /// Emit the fragments, then stop rule evaluation.
    Stop,
    /// Fail the request with `message`.
    Fail,
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RuleAction::Emit => "emit",
            RuleAction::Next => "next",
            RuleAction::Stop => "stop",
            RuleAction::Fail => "fail",
        })
    }
}
