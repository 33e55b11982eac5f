use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

/// Default step budget for references and combinators.
pub const DEFAULT_DEPTH_BUDGET: usize = 64;

/// A configuration file that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file.
        path:   PathBuf,
        /// Why reading failed.
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Evaluation settings.
///
/// ## Example
/// ```
/// use zmanim_dsl::config::{DEFAULT_DEPTH_BUDGET, EngineConfig};
///
/// assert_eq!(EngineConfig::default().depth_budget, DEFAULT_DEPTH_BUDGET);
/// assert_eq!(EngineConfig::from_toml_str("depth_budget = 8").unwrap().depth_budget, 8);
/// assert!(EngineConfig::from_toml_str("depth = 8").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// How many reference resolutions and combinator calls one evaluation
    /// may make before it gives up with `DepthExceeded`.
    #[serde(default = "default_depth_budget")]
    pub depth_budget: usize,
}

const fn default_depth_budget() -> usize {
    DEFAULT_DEPTH_BUDGET
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { depth_budget: default_depth_budget() }
    }
}

impl EngineConfig {
    /// Parses engine settings from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

/// Contents of a configuration file: engine settings plus named formulas.
///
/// ```toml
/// [engine]
/// depth_budget = 32
///
/// [formulas]
/// alos = "solar(16.1, before_sunrise)"
/// tzais = "sunset + 18min"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZmanimConfig {
    /// Engine settings.
    #[serde(default)]
    pub engine:   EngineConfig,
    /// Formula sources by name.
    #[serde(default)]
    pub formulas: BTreeMap<String, String>,
}

impl ZmanimConfig {
    /// Parses a configuration file's contents.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(),
                                                                                  source })?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_file() {
        let config = ZmanimConfig::from_toml_str(
                                                 r#"
            [engine]
            depth_budget = 32

            [formulas]
            alos = "solar(16.1, before_sunrise)"
            tzais = "sunset + 18min"
            "#,
        ).unwrap();

        assert_eq!(config.engine.depth_budget, 32);
        assert_eq!(config.formulas.keys().collect::<Vec<_>>(), ["alos", "tzais"]);
    }

    #[test]
    fn every_section_is_optional() {
        let config = ZmanimConfig::from_toml_str("").unwrap();
        assert_eq!(config, ZmanimConfig::default());

        let config = ZmanimConfig::from_toml_str("[engine]").unwrap();
        assert_eq!(config.engine.depth_budget, DEFAULT_DEPTH_BUDGET);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(ZmanimConfig::from_toml_str("[engine]\nbudget = 3"),
                         Err(ConfigError::Parse(_))));
        assert!(ZmanimConfig::from_toml_str("[zmanim]").is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = ZmanimConfig::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(error.to_string().contains("does/not/exist.toml"));
    }
}
