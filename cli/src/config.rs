use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

/// Optional user configuration, TOML.
///
/// ```toml
/// [interpreters]
/// ruby = "ruby"
/// lua = "lua5.4"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Language tag → interpreter program, merged over the built-in defaults.
    #[serde(default)]
    pub interpreters: BTreeMap<String, String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "cannot read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "cannot parse config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&source).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
