/// How a wrapped `expr?` return should treat a callee with more than
/// one non-error return value. Reserved for the emitter/preprocessor
/// boundary; the exact semantics of each mode are an implementer
/// choice, not something the plugins themselves need to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiValueReturn {
    Discard,
    Wrap,
}

/// Tunables the pipeline hands every plugin through [`crate::PluginContext`].
/// Built once per compile from the resolved workspace configuration.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Pattern-match plugin: reject a non-exhaustive match instead of
    /// only warning.
    pub strict_exhaustiveness: bool,
    pub multi_value_return: MultiValueReturn,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self { strict_exhaustiveness: true, multi_value_return: MultiValueReturn::Wrap }
    }
}
