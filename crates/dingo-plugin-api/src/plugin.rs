use dingo_foundation::DiagnosticError;

use crate::context::PluginContext;

/// One stage of the AST transform pipeline.
///
/// A plugin runs three phases per file, in order, across every
/// registered plugin before the next phase begins: [`discover`] scans
/// read-only, [`transform`] mutates the AST in place, [`inject`] appends
/// top-level declarations the transform needed. Each has a no-op
/// default so a plugin only overrides the phases it uses.
///
/// [`discover`]: Plugin::discover
/// [`transform`]: Plugin::transform
/// [`inject`]: Plugin::inject
pub trait Plugin {
    /// Stable name used in dependency declarations and cycle reports.
    fn name(&self) -> &'static str;

    /// Names of plugins whose phases must all complete on this file
    /// before this plugin's own phases start.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Clears state carried over from a previous file. Called before
    /// `discover` on every file; a plugin that caches per-file state in
    /// `discover` and skips resetting it here will see stale data once
    /// the pipeline moves to the next file.
    fn reset(&mut self) {}

    fn discover(&mut self, ctx: &PluginContext) -> Result<(), DiagnosticError> {
        let _ = ctx;
        Ok(())
    }

    fn transform(&mut self, ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
        let _ = ctx;
        Ok(())
    }

    fn inject(&mut self, ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
        let _ = ctx;
        Ok(())
    }
}
