//! Engine config resolution for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tabmark_core::EngineConfig;
use tracing::debug;

use super::error::HelpfulError;

const CONFIG_FILE: &str = "config.toml";

/// Default config location: $TABMARK_HOME/config.toml
pub fn default_config_path() -> PathBuf {
    tabmark_logging::tabmark_home().join(CONFIG_FILE)
}

/// Load the engine config.
///
/// An explicit path must exist. Without one, the default location is used
/// when present and built-in defaults otherwise.
pub fn load_engine_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(HelpfulError::file_not_found(path).into()),
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path();
            if !path.exists() {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(EngineConfig::default());
            }
            path
        }
    };
    load_from(&path)
}

fn load_from(path: &Path) -> Result<EngineConfig> {
    let config = EngineConfig::load(path)
        .map_err(|e| HelpfulError::invalid_config(path, &e.to_string()))?;
    debug!(
        path = %path.display(),
        pattern = %config.self_surface_pattern,
        "loaded engine config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_engine_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.downcast_ref::<HelpfulError>().is_some());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "self_surface_pattern = \"^about:\"\n").unwrap();
        let config = load_engine_config(Some(&path)).unwrap();
        assert_eq!(config.self_surface_pattern, "^about:");
    }

    #[test]
    fn invalid_config_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "colour = \"blue\"\n").unwrap();
        let err = load_engine_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
