use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchSyntax {
    Rust,
    /// Reserved; rejected at load time until implemented.
    Swift,
}

impl Default for MatchSyntax {
    fn default() -> Self {
        MatchSyntax::Rust
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    Off,
    Inline,
    External,
}

impl Default for SourceMapMode {
    fn default() -> Self {
        SourceMapMode::External
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NilSafetyMode {
    Off,
    Debug,
    On,
}

impl Default for NilSafetyMode {
    fn default() -> Self {
        NilSafetyMode::Debug
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct MatchConfig {
    pub syntax: MatchSyntax,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { syntax: MatchSyntax::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct FeatureToggle {
    pub enabled: bool,
}

impl Default for FeatureToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct FeaturesConfig {
    pub result_type: FeatureToggle,
    pub option_type: FeatureToggle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct CodegenConfig {
    pub source_maps: SourceMapMode,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self { source_maps: SourceMapMode::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct DebugConfig {
    pub nil_safety_checks: NilSafetyMode,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self { nil_safety_checks: NilSafetyMode::default() }
    }
}

/// The full shape of `dingo.toml`. Every field is optional in the file
/// itself; `#[serde(default)]` fills in the documented defaults, and
/// `deny_unknown_fields` rejects typos and stale keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    #[serde(rename = "match")]
    pub match_config: MatchConfig,
    pub features: FeaturesConfig,
    pub codegen: CodegenConfig,
    pub debug: DebugConfig,
}
