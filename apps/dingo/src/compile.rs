//! Runs the full preprocessor -> parser -> type-check -> plugin ->
//! emit pipeline over one `.dingo` file and writes its `.go` output
//! alongside it. This is the CLI's own single-file build path, and it
//! doubles as the `Transpile` callback `dingo-workspace` drives one
//! file at a time per build level.

use std::fs;
use std::path::Path;

use dingo_foundation::{DiagnosticError, DiagnosticSink, Severity};
use dingo_goast::ParsedFile;
use dingo_plugin_api::{MultiValueReturn, Pipeline as PluginPipeline, Plugin, PluginConfig};
use dingo_plugins::{NoneContextPlugin, OptionTypePlugin, PatternMatchPlugin, ResultTypePlugin};
use dingo_preprocessor::Pipeline as PreprocessorPipeline;

pub fn compile_file(path: &Path, multi_value_return: MultiValueReturn) -> Result<(), DiagnosticError> {
    let file = path.to_string_lossy().into_owned();
    let source = fs::read_to_string(path).map_err(|e| DiagnosticError::Internal {
        message: format!("failed to read {}: {e}", path.display()),
        context: "compile".to_string(),
    })?;

    let preprocessed = PreprocessorPipeline::standard().run(&file, &source, &Default::default())?;

    let parsed = ParsedFile::parse(file.clone(), &preprocessed.source).map_err(|e| DiagnosticError::Syntax {
        file: file.clone(),
        pos: e.pos(),
        message: e.to_string(),
    })?;

    let mut sink = DiagnosticSink::new();
    let check_result = dingo_typecheck::check(&parsed, &mut sink)?;

    let plugin_config = PluginConfig { strict_exhaustiveness: true, multi_value_return };
    let mut ast = parsed.ast;
    let mut result_type = ResultTypePlugin::default();
    let mut option_type = OptionTypePlugin::default();
    let mut pattern_match = PatternMatchPlugin::with_registry(preprocessed.enum_registry);
    let mut none_context = NoneContextPlugin::default();
    {
        let plugins: Vec<&mut dyn Plugin> =
            vec![&mut result_type, &mut option_type, &mut pattern_match, &mut none_context];
        let mut pipeline = PluginPipeline::new(plugins)?;
        pipeline.run_file(
            &file,
            &mut ast,
            &parsed.parents,
            &parsed.comments,
            &check_result.info,
            &mut sink,
            &plugin_config,
        )?;
    }

    if let Some(first_error) = sink.diagnostics().iter().find(|d| d.severity == Severity::Error) {
        return Err(DiagnosticError::Type {
            file: first_error.file.clone(),
            pos: first_error.pos,
            message: first_error.message.clone(),
        });
    }

    let go_path = path.with_extension("go");
    let go_file = go_path.to_string_lossy().into_owned();
    let (go_source, _map) = dingo_emit::emit(&file, &go_file, &ast, &parsed.comments, &preprocessed.map)
        .map_err(|e| DiagnosticError::Internal { message: e.to_string(), context: "emit".to_string() })?;

    fs::write(&go_path, go_source).map_err(|e| DiagnosticError::Internal {
        message: format!("failed to write {}: {e}", go_path.display()),
        context: "compile".to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_simple_function_and_writes_go_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("f.dingo");
        fs::write(&src, "package p\n\nfunc Add(a int, b int) int {\n\treturn a + b\n}\n").unwrap();

        compile_file(&src, MultiValueReturn::Wrap).unwrap();

        let go = fs::read_to_string(dir.path().join("f.go")).unwrap();
        assert!(go.contains("func Add(a int, b int) int"));
    }

    #[test]
    fn a_syntax_error_is_reported_as_a_user_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bad.dingo");
        fs::write(&src, "package p\n\nfunc F( {\n").unwrap();

        let err = compile_file(&src, MultiValueReturn::Wrap).unwrap_err();
        assert!(matches!(err, DiagnosticError::Syntax { .. }));
    }

}
