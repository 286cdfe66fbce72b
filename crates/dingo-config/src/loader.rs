use std::path::{Path, PathBuf};

use dingo_foundation::DiagnosticError;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;

use crate::types::{AppConfig, MatchSyntax};

/// Loads configuration in the documented layering order: built-in
/// defaults, then `~/.dingo/config.toml`, then the workspace's
/// `dingo.toml`, then caller-supplied overrides (typically parsed CLI
/// flags). Later layers win.
pub fn load(workspace_root: &Path) -> Result<AppConfig, DiagnosticError> {
    load_layered(workspace_root, Figment::new())
}

/// Same as [`load`], but accepts a final override layer so the CLI can
/// fold `--set key=value` flags in after the file layers.
pub fn load_layered(workspace_root: &Path, overrides: Figment) -> Result<AppConfig, DiagnosticError> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(home_config) = home_config_path() {
        if home_config.is_file() {
            figment = figment.merge(Toml::file(&home_config));
        }
    }

    let workspace_config = workspace_root.join("dingo.toml");
    if workspace_config.is_file() {
        figment = figment.merge(Toml::file(&workspace_config));
    }

    figment = figment.merge(overrides);

    let config: AppConfig = figment.extract().map_err(|e| DiagnosticError::Config {
        key: figment_error_path(&e),
        message: e.to_string(),
    })?;

    validate(&config)?;
    Ok(config)
}

fn figment_error_path(err: &figment::Error) -> String {
    if err.path.is_empty() {
        "dingo.toml".to_string()
    } else {
        err.path.join(".")
    }
}

fn home_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| Path::new(&home).join(".dingo").join("config.toml"))
}

fn validate(config: &AppConfig) -> Result<(), DiagnosticError> {
    if config.match_config.syntax == MatchSyntax::Swift {
        return Err(DiagnosticError::Config {
            key: "match.syntax".to_string(),
            message: "\"swift\" match syntax is reserved and not yet implemented".to_string(),
        });
    }

    if !config.features.result_type.enabled && !config.features.option_type.enabled {
        return Err(DiagnosticError::Config {
            key: "match.syntax".to_string(),
            message: "match.syntax requires features.result_type.enabled or features.option_type.enabled".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_workspace_config(dir: &tempfile::TempDir, contents: &str) {
        let path = dir.path().join("dingo.toml");
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn defaults_are_used_when_no_files_are_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path()).unwrap();
        assert_eq!(config.match_config.syntax, MatchSyntax::Rust);
        assert!(config.features.result_type.enabled);
        assert!(config.features.option_type.enabled);
    }

    #[test]
    fn workspace_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace_config(
            &dir,
            r#"
            [features]
            option_type = { enabled = false }

            [codegen]
            source_maps = "inline"
            "#,
        );
        let config = load(dir.path()).unwrap();
        assert!(!config.features.option_type.enabled);
        assert!(config.features.result_type.enabled);
        assert_eq!(config.codegen.source_maps, crate::types::SourceMapMode::Inline);
    }

    #[test]
    fn swift_match_syntax_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace_config(&dir, "[match]\nsyntax = \"swift\"\n");
        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("swift"));
    }

    #[test]
    fn match_syntax_requires_a_sum_type_feature() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace_config(
            &dir,
            r#"
            [features]
            result_type = { enabled = false }
            option_type = { enabled = false }
            "#,
        );
        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("match.syntax"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace_config(&dir, "unknown_top_level_key = true\n");
        assert!(load(dir.path()).is_err());
    }

    #[test]
    fn cli_overrides_win_over_workspace_file() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace_config(&dir, "[codegen]\nsource_maps = \"inline\"\n");
        let overrides = Figment::new().merge(Toml::string("[codegen]\nsource_maps = \"off\""));
        let config = load_layered(dir.path(), overrides).unwrap();
        assert_eq!(config.codegen.source_maps, crate::types::SourceMapMode::Off);
    }
}
