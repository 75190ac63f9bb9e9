use crate::core::db::ConnectOptions;
use crate::core::{BridgeError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Which native connector to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// In-process engine, no server needed.
    #[default]
    Embedded,
    /// libmysqlclient; requires the `mysqlclient` feature.
    Mysql,
}

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub driver: DriverKind,
    #[serde(default)]
    pub connection: ConnectOptions,
    pub output: Option<OutputConfig>,
}

/// Result printing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub json: Option<bool>,
    /// Text printed for NULL values in table output
    pub null_text: Option<String>,
}

impl Config {
    /// Whether results should be printed as JSON lines.
    pub fn json_output(&self) -> bool {
        self.output.as_ref().and_then(|o| o.json).unwrap_or(false)
    }

    pub fn null_text(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.null_text.as_deref())
            .unwrap_or("NULL")
    }
}

/// Default config location: `<config dir>/mysql-bridge/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mysql-bridge").join("config.toml"))
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    if config.connection.host.is_empty() {
        return Err(BridgeError::Config("connection.host must not be empty".to_string()));
    }
    Ok(config)
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = mysql_bridge::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
