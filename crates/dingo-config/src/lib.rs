pub mod loader;
pub mod types;

pub use loader::{load, load_layered};
pub use types::{
    AppConfig, CodegenConfig, DebugConfig, FeatureToggle, FeaturesConfig, MatchConfig,
    MatchSyntax, NilSafetyMode, SourceMapMode,
};
