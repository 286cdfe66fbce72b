pub mod diagnostic;
pub mod error;
pub mod logging;

pub use diagnostic::{Diagnostic, DiagnosticSink, Hint, Severity};
pub use error::{DiagnosticError, DingoResult};
pub use logging::LoggingOptions;
