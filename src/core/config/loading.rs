//! Locates and parses the optional TOML configuration file.

use super::file::ConfigFile;
use crate::core::error::{AppError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const LOCAL_CONFIG_NAME: &str = "email-triage.toml";

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];
    if let Ok(home) = std::env::var("HOME") {
        paths.push(
            PathBuf::from(home)
                .join(".config")
                .join("email-triage")
                .join("config.toml"),
        );
    }
    paths
}

/// Loads the configuration file.
///
/// An explicit path must exist. Without one, the default locations are tried
/// in order and an empty [`ConfigFile`] is returned when none is present.
pub fn load_config_file(explicit: Option<&Path>) -> Result<(ConfigFile, Option<String>)> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(AppError::Config(format!(
                "Config file '{}' does not exist",
                path.display()
            )));
        }
        let parsed = parse_file(path)?;
        return Ok((parsed, Some(path.display().to_string())));
    }

    for path in candidate_paths() {
        if path.is_file() {
            tracing::debug!("Found config file at {}", path.display());
            let parsed = parse_file(&path)?;
            return Ok((parsed, Some(path.display().to_string())));
        }
    }

    tracing::debug!("No config file found, using built-in defaults");
    Ok((ConfigFile::default(), None))
}

fn parse_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse '{}': {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = load_config_file(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn explicit_path_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch]\nbatch_size = 10").unwrap();
        let (parsed, loaded) = load_config_file(Some(file.path())).unwrap();
        assert_eq!(parsed.dispatch.batch_size, Some(10));
        assert_eq!(loaded, Some(file.path().display().to_string()));
    }

    #[test]
    fn malformed_file_reports_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch\nbatch_size = ").unwrap();
        let result = load_config_file(Some(file.path()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
