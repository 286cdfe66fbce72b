//! CLI entry point: a thin `clap`-derive front end over the library
//! crates. Exit codes: 0 success, 1 user error (parse/type/
//! exhaustiveness/cycle/config), 2 internal error.

mod compile;

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use dingo_foundation::{logging, DiagnosticError, LoggingOptions};
use dingo_plugin_api::MultiValueReturn;
use dingo_workspace::{BuildOptions, FileOutcome, Transpile};
use tracing::info;

#[derive(Parser)]
#[command(name = "dingo")]
#[command(about = "Dingo: a Go superset that compiles to plain, gofmt-clean Go")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the given `.dingo` files, or the whole workspace if none are given.
    Build {
        /// Files to compile. If empty, the workspace containing the current directory is discovered and built.
        inputs: Vec<PathBuf>,

        /// Output path. Only valid with a single input file.
        #[arg(short = 'o')]
        output: Option<PathBuf>,

        #[arg(long = "multi-value-return", value_enum, default_value = "wrap")]
        multi_value_return: MultiValueReturnArg,
    },
    /// Compile a single file and run the resulting Go program.
    Run {
        file: PathBuf,

        /// Arguments forwarded to the compiled program.
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Print the compiler version.
    Version,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MultiValueReturnArg {
    Discard,
    Wrap,
}

impl From<MultiValueReturnArg> for MultiValueReturn {
    fn from(value: MultiValueReturnArg) -> Self {
        match value {
            MultiValueReturnArg::Discard => MultiValueReturn::Discard,
            MultiValueReturnArg::Wrap => MultiValueReturn::Wrap,
        }
    }
}

fn main() -> ExitCode {
    logging::init(&LoggingOptions::default());
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { inputs, output, multi_value_return } => {
            run_build(inputs, output, multi_value_return.into())
        }
        Commands::Run { file, args } => run_program(&file, &args),
        Commands::Version => {
            println!("dingo {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run_build(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    multi_value_return: MultiValueReturn,
) -> Result<(), DiagnosticError> {
    if inputs.is_empty() {
        return build_workspace_from_cwd(multi_value_return);
    }

    if output.is_some() && inputs.len() > 1 {
        return Err(DiagnosticError::Config {
            key: "-o".to_string(),
            message: "-o only applies when a single input file is given".to_string(),
        });
    }

    for input in &inputs {
        info!(file = %input.display(), "compiling");
        compile::compile_file(input, multi_value_return)?;
    }

    if let (Some(output), Some(input)) = (output, inputs.first()) {
        let go_path = input.with_extension("go");
        std::fs::rename(&go_path, &output).map_err(|e| DiagnosticError::Internal {
            message: format!("failed to move {} to {}: {e}", go_path.display(), output.display()),
            context: "build".to_string(),
        })?;
    }

    Ok(())
}

fn build_workspace_from_cwd(multi_value_return: MultiValueReturn) -> Result<(), DiagnosticError> {
    let cwd = std::env::current_dir().map_err(|e| DiagnosticError::Internal {
        message: format!("failed to read current directory: {e}"),
        context: "build".to_string(),
    })?;
    let workspace = dingo_workspace::discover(&cwd)?;
    info!(root = %workspace.root.display(), module = %workspace.module_path, "discovered workspace");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().map_err(|e| {
        DiagnosticError::Internal {
            message: format!("failed to start async runtime: {e}"),
            context: "build".to_string(),
        }
    })?;

    let transpile: Transpile =
        Arc::new(move |path: &Path| compile::compile_file(path, multi_value_return).map_err(|e| e.to_string()));

    let cache_path = workspace.root.join(".dingo-cache.json");
    let options = BuildOptions::new(cache_path);

    let report = runtime.block_on(dingo_workspace::build_workspace(
        &workspace.graph,
        &workspace.order,
        transpile,
        options,
    ))?;

    if report.has_failures() {
        let failure = report
            .files
            .iter()
            .find_map(|f| match &f.outcome {
                FileOutcome::Failed { error } => Some(error.clone()),
                _ => None,
            })
            .unwrap_or_else(|| "one or more packages failed to build".to_string());
        return Err(DiagnosticError::Internal { message: failure, context: "workspace build".to_string() });
    }

    Ok(())
}

fn run_program(file: &Path, args: &[String]) -> Result<(), DiagnosticError> {
    compile::compile_file(file, MultiValueReturn::Wrap)?;
    let go_path = file.with_extension("go");

    let status =
        Command::new("go").arg("run").arg(&go_path).args(args).status().map_err(|e| DiagnosticError::Internal {
            message: format!("failed to invoke `go run {}`: {e}", go_path.display()),
            context: "run".to_string(),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(DiagnosticError::Internal {
            message: format!("program exited with {status}"),
            context: "run".to_string(),
        })
    }
}

/// Everything the compiler's own diagnostic vocabulary can raise is a
/// user error (1) except `Internal`, which is 2 — with one exception:
/// `dingo-workspace` wraps a detected dependency cycle as `Internal`
/// tagged with the "workspace build order" context (its own `CycleError`
/// can report several simultaneous cycles, which doesn't fit
/// `DiagnosticError::Cycle`'s single-path shape). A cycle is a mistake
/// in the caller's own package layout, not a compiler bug, so it's
/// still a user error.
fn exit_code_for(err: &DiagnosticError) -> u8 {
    match err {
        DiagnosticError::Syntax { .. }
        | DiagnosticError::Type { .. }
        | DiagnosticError::Exhaustiveness { .. }
        | DiagnosticError::Inference { .. }
        | DiagnosticError::AmbiguousStdlib { .. }
        | DiagnosticError::Cycle { .. }
        | DiagnosticError::Config { .. } => 1,
        DiagnosticError::Internal { context, .. } if context == "workspace build order" => 1,
        DiagnosticError::Internal { .. } => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_sourcemap::Position;

    #[test]
    fn syntax_errors_exit_with_user_error_code() {
        let err = DiagnosticError::Syntax { file: "a.dingo".to_string(), pos: Position::new(1, 1), message: "x".to_string() };
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn a_wrapped_build_order_cycle_exits_with_user_error_code() {
        let err = DiagnosticError::Internal {
            message: "circular package dependency".to_string(),
            context: "workspace build order".to_string(),
        };
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn other_internal_errors_exit_with_internal_error_code() {
        let err = DiagnosticError::Internal { message: "boom".to_string(), context: "build".to_string() };
        assert_eq!(exit_code_for(&err), 2);
    }
}
