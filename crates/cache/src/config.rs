//! Gallery configuration
//!
//! Settings can be loaded from a TOML file, from environment variables, or
//! built programmatically.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::budget::MemoryBudget;
use crate::source::SimulatedSource;

/// Environment variable holding the memory budget (e.g. `512M`, `60000`)
pub const BUDGET_ENV: &str = "GALLERY_BUDGET";

/// Environment variable holding the simulated load latency in milliseconds
pub const LOAD_LATENCY_ENV: &str = "GALLERY_LOAD_LATENCY_MS";

/// Configuration for a [`Gallery`](crate::Gallery).
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Maximum total footprint of resident pictures
    pub budget: MemoryBudget,
    /// Artificial delay of each picture load
    pub load_latency: Duration,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            budget: MemoryBudget::from_mb(256),
            load_latency: Duration::ZERO,
        }
    }
}

/// On-disk layout. Every key is optional and unknown keys are ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    budget: Option<MemoryBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    load_latency_ms: Option<u64>,
}

impl GalleryConfig {
    pub fn new(budget: MemoryBudget) -> Self {
        Self {
            budget,
            ..Default::default()
        }
    }

    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_budget_mb(mut self, mb: u64) -> Self {
        self.budget = MemoryBudget::from_mb(mb);
        self
    }

    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Source that simulates loads with this config's latency
    pub fn source(&self) -> SimulatedSource {
        SimulatedSource::new(self.load_latency)
    }

    /// Returns the default config file location for the current platform.
    ///
    /// - Linux: ~/.config/gallery/gallery.toml
    /// - macOS: ~/Library/Application Support/gallery/gallery.toml
    /// - Windows: %APPDATA%\gallery\gallery.toml
    pub fn default_config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("gallery").join("gallery.toml"),
            None => PathBuf::from("gallery.toml"),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// - `GALLERY_BUDGET`: memory budget (default: 256M)
    /// - `GALLERY_LOAD_LATENCY_MS`: load latency in ms (default: 0)
    ///
    /// # Errors
    /// Returns an error if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(BUDGET_ENV) {
            config.budget =
                MemoryBudget::parse(&val).map_err(|_| ConfigError::invalid(BUDGET_ENV, &val))?;
        }

        if let Ok(val) = std::env::var(LOAD_LATENCY_ENV) {
            let ms = val
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::invalid(LOAD_LATENCY_ENV, &val))?;
            config.load_latency = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// ```toml
    /// budget = "512M"        # or a byte count: budget = 60000
    /// load_latency_ms = 250
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from a TOML string. Missing keys keep defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(toml_str)?;
        let mut config = Self::default();

        if let Some(budget) = file.budget {
            config.budget = budget;
        }
        if let Some(ms) = file.load_latency_ms {
            config.load_latency = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Renders configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let file = ConfigFile {
            budget: Some(self.budget),
            load_latency_ms: Some(u64::try_from(self.load_latency.as_millis()).unwrap_or(u64::MAX)),
        };
        Ok(toml::to_string(&file)?)
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    fn invalid(key: &str, value: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = GalleryConfig::default();
        assert_eq!(config.budget.as_mb(), 256);
        assert_eq!(config.load_latency, Duration::ZERO);
    }

    #[test]
    fn test_builder_methods() {
        let config = GalleryConfig::default()
            .with_budget_mb(64)
            .with_load_latency(Duration::from_millis(5));
        assert_eq!(config.budget.as_bytes(), 64 * 1024 * 1024);
        assert_eq!(config.source().latency(), Duration::from_millis(5));

        let config = config.with_budget(MemoryBudget::from_bytes(60_000));
        assert_eq!(config.budget.as_bytes(), 60_000);
    }

    #[test]
    fn test_default_config_path_file_name() {
        let path = GalleryConfig::default_config_path();
        assert_eq!(path.file_name().unwrap(), "gallery.toml");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::new(&[BUDGET_ENV, LOAD_LATENCY_ENV]);

        env::set_var(BUDGET_ENV, "60000");
        env::set_var(LOAD_LATENCY_ENV, "15");

        let config = GalleryConfig::from_env().unwrap();
        assert_eq!(config.budget.as_bytes(), 60_000);
        assert_eq!(config.load_latency, Duration::from_millis(15));
    }

    #[test]
    #[serial]
    fn test_from_env_partial() {
        let _guard = EnvGuard::new(&[BUDGET_ENV, LOAD_LATENCY_ENV]);

        env::remove_var(LOAD_LATENCY_ENV);
        env::set_var(BUDGET_ENV, "1G");

        let config = GalleryConfig::from_env().unwrap();
        assert_eq!(config.budget.as_mb(), 1024);
        assert_eq!(config.load_latency, Duration::ZERO); // default
    }

    #[test]
    #[serial]
    fn test_from_env_invalid() {
        let _guard = EnvGuard::new(&[BUDGET_ENV, LOAD_LATENCY_ENV]);

        env::remove_var(LOAD_LATENCY_ENV);
        env::set_var(BUDGET_ENV, "lots");
        match GalleryConfig::from_env() {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, BUDGET_ENV);
                assert_eq!(value, "lots");
            }
            other => panic!("expected invalid value, got {other:?}"),
        }

        env::remove_var(BUDGET_ENV);
        env::set_var(LOAD_LATENCY_ENV, "soon");
        assert!(GalleryConfig::from_env().is_err());
    }

    // Saves and restores environment variables around a test
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names
                .iter()
                .map(|name| (name.to_string(), env::var(name).ok()))
                .collect();
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    fn test_from_toml() {
        let config = GalleryConfig::from_toml(
            r#"
            # gallery settings
            budget = "512M"
            load_latency_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.budget.as_mb(), 512);
        assert_eq!(config.load_latency, Duration::from_millis(250));
    }

    #[test]
    fn test_from_toml_byte_count_and_unknown_keys() {
        let config = GalleryConfig::from_toml("budget = 60000\ntheme = \"dark\"\n").unwrap();
        assert_eq!(config.budget.as_bytes(), 60_000);
        assert_eq!(config.load_latency, Duration::ZERO);
    }

    #[test]
    fn test_from_toml_invalid_budget() {
        assert!(matches!(
            GalleryConfig::from_toml("budget = \"huge\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = GalleryConfig::new(MemoryBudget::from_bytes(60_000))
            .with_load_latency(Duration::from_millis(40));
        let toml = config.to_toml().unwrap();
        assert_eq!(GalleryConfig::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn test_file_save_and_load() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join("nested").join("gallery.toml");

        let config = GalleryConfig::default().with_budget_mb(32);
        config.save_to_file(&path).unwrap();

        assert_eq!(GalleryConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_from_file_missing() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        assert!(matches!(
            GalleryConfig::from_file(temp.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
