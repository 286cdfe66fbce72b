use dingo_foundation::DiagnosticError;
use dingo_sourcemap::SourceMap;

use crate::enum_registry::EnumRegistry;

/// Feature toggles the pipeline consults. Populated by the caller from
/// the loaded `dingo.toml` (`dingo-config` lives above this crate, so
/// it hands over these plain booleans rather than this crate depending
/// on the config crate).
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub rust_match_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { rust_match_enabled: true }
    }
}

pub struct ProcessorInput<'a> {
    pub file: &'a str,
    pub source: &'a str,
}

pub struct ProcessorOutput {
    pub source: String,
    pub map: SourceMap,
}

/// State threaded through the whole pipeline run. Only the enum pass
/// writes to `enum_registry`; later passes (rust-match, here, and the
/// pattern-match plugin downstream) read it.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub enum_registry: EnumRegistry,
}

pub trait Processor {
    fn name(&self) -> &'static str;

    fn enabled(&self, _config: &PipelineConfig) -> bool {
        true
    }

    fn run(
        &self,
        input: &ProcessorInput<'_>,
        config: &PipelineConfig,
        state: &mut PipelineState,
    ) -> Result<ProcessorOutput, DiagnosticError>;
}

fn compose_error(stage: &'static str, err: impl std::fmt::Display) -> DiagnosticError {
    DiagnosticError::Internal {
        message: format!("failed to compose source map after `{stage}` pass"),
        context: err.to_string(),
    }
}

/// The canonical textual-pass order: type-annotations -> error-propagation
/// -> enums -> rust-match (opt-in) -> keywords. Ordering is load-bearing:
/// enums must run before rust-match so match arms can resolve variant tag
/// constants, and keywords must run after error-propagation so the `var`
/// blocks it emits are not re-rewritten.
pub struct Pipeline {
    processors: Vec<Box<dyn Processor>>,
}

pub struct PipelineOutput {
    pub source: String,
    pub map: SourceMap,
    pub enum_registry: EnumRegistry,
}

impl Pipeline {
    pub fn standard() -> Self {
        Self {
            processors: vec![
                Box::new(crate::type_annotations::TypeAnnotationProcessor),
                Box::new(crate::error_propagation::ErrorPropagationProcessor),
                Box::new(crate::enums::EnumProcessor),
                Box::new(crate::rust_match::RustMatchProcessor),
                Box::new(crate::keywords::KeywordProcessor),
            ],
        }
    }

    pub fn run(&self, file: &str, source: &str, config: &PipelineConfig) -> Result<PipelineOutput, DiagnosticError> {
        let mut current = source.to_string();
        let mut running_map = SourceMap::identity(file, file);
        let mut state = PipelineState::default();

        for processor in &self.processors {
            if !processor.enabled(config) {
                continue;
            }
            let input = ProcessorInput { file, source: &current };
            let output = processor.run(&input, config, &mut state)?;
            running_map = running_map
                .compose(&output.map)
                .map_err(|e| compose_error(processor.name(), e))?;
            tracing::debug!(pass = processor.name(), bytes = output.source.len(), "ran preprocessor pass");
            current = output.source;
        }

        Ok(PipelineOutput { source: current, map: running_map, enum_registry: state.enum_registry })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}
