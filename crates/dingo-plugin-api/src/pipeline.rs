use dingo_foundation::{DiagnosticError, DiagnosticSink};
use dingo_goast::{Ast, Comment, ParentMap};
use dingo_typecheck::Info;

use crate::config::PluginConfig;
use crate::context::PluginContext;
use crate::plugin::Plugin;
use crate::scheduler::schedule;

/// Runs a registered set of plugins over one file: resolves execution
/// order once at construction, then drives discover/transform/inject
/// breadth-first across all plugins for each file — every plugin's
/// discover runs before any plugin's transform, and so on.
pub struct Pipeline<'p> {
    plugins: Vec<&'p mut dyn Plugin>,
    order: Vec<usize>,
}

impl<'p> Pipeline<'p> {
    pub fn new(plugins: Vec<&'p mut dyn Plugin>) -> Result<Self, DiagnosticError> {
        let order = {
            let refs: Vec<&dyn Plugin> = plugins.iter().map(|p| &**p).collect();
            schedule(&refs)?
        };
        Ok(Self { plugins, order })
    }

    /// Runs all three phases over one file's AST. `path` and the other
    /// borrows build the per-file [`PluginContext`]; the caller owns
    /// all of them and can release them once this returns.
    pub fn run_file(
        &mut self,
        path: &str,
        ast: &mut Ast,
        parents: &ParentMap,
        comments: &[Comment],
        info: &Info,
        sink: &mut DiagnosticSink,
        config: &PluginConfig,
    ) -> Result<(), DiagnosticError> {
        for &i in &self.order {
            self.plugins[i].reset();
        }

        for &i in &self.order {
            let ctx = PluginContext::new(path, ast, parents, comments, info, sink, config);
            self.plugins[i].discover(&ctx)?;
        }

        for &i in &self.order {
            let mut ctx = PluginContext::new(path, ast, parents, comments, info, sink, config);
            self.plugins[i].transform(&mut ctx)?;
        }

        for &i in &self.order {
            let mut ctx = PluginContext::new(path, ast, parents, comments, info, sink, config);
            self.plugins[i].inject(&mut ctx)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_goast::ParsedFile;

    struct Counting {
        name: &'static str,
        discovers: usize,
        transforms: usize,
        resets: usize,
    }

    impl Counting {
        fn new(name: &'static str) -> Self {
            Self { name, discovers: 0, transforms: 0, resets: 0 }
        }
    }

    impl Plugin for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn reset(&mut self) {
            self.resets += 1;
        }

        fn discover(&mut self, _ctx: &PluginContext) -> Result<(), DiagnosticError> {
            self.discovers += 1;
            Ok(())
        }

        fn transform(&mut self, _ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
            self.transforms += 1;
            Ok(())
        }
    }

    #[test]
    fn running_a_file_resets_discovers_and_transforms_every_plugin_once() {
        let mut a = Counting::new("a");
        let mut b = Counting::new("b");
        let parsed = ParsedFile::parse("m.dingo", "package p\n\nfunc F() {}\n").unwrap();
        let mut ast = parsed.ast;
        let info = Info::default();
        let mut sink = DiagnosticSink::new();
        let config = PluginConfig::default();

        {
            let plugins: Vec<&mut dyn Plugin> = vec![&mut a, &mut b];
            let mut pipeline = Pipeline::new(plugins).unwrap();
            pipeline
                .run_file("m.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config)
                .unwrap();
        }

        assert_eq!(a.discovers, 1);
        assert_eq!(a.transforms, 1);
        assert_eq!(a.resets, 1);
        assert_eq!(b.discovers, 1);
    }
}
