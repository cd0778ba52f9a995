//! Server configuration.
//!
//! Values come from command-line flags layered over an optional TOML file,
//! layered over built-in defaults. A flag always wins over the file.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

/// Command-line arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "barehttp", version, about = "A minimal HTTP/1.1 file and echo server")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on (e.g. 0.0.0.0:8080)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Directory served by /files/:name
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Maximum number of connections handled at once
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Seconds a client may take to send its request
    #[arg(long)]
    pub read_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
    pub max_connections: Option<usize>,
    /// Seconds.
    pub read_timeout: Option<u64>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_connections: None,
            read_timeout: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_owned()
}

fn default_directory() -> PathBuf {
    PathBuf::from("tmp/")
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Final resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen: String,
    pub directory: PathBuf,
    pub max_connections: Option<usize>,
    pub read_timeout: Option<Duration>,
    pub log_level: String,
}

impl Config {
    /// Parses the process arguments and loads the file they name, if any.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Resolves already-parsed arguments, reading the TOML file they name.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| {
                    ConfigError::FileRead {
                        path: path.clone(),
                        source,
                    }
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
                    path: path.clone(),
                    source,
                })?
            }
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// Layers `cli` over `file`.
    pub fn merge(cli: CliArgs, file: FileConfig) -> Result<Self, ConfigError> {
        let max_connections = cli.max_connections.or(file.server.max_connections);
        if max_connections == Some(0) {
            return Err(ConfigError::Invalid(
                "max_connections must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            listen: cli.listen.unwrap_or(file.server.listen),
            directory: cli.directory.unwrap_or(file.storage.directory),
            max_connections,
            read_timeout: cli
                .read_timeout
                .or(file.server.read_timeout)
                .map(Duration::from_secs),
            log_level: cli.log_level.unwrap_or(file.logging.level),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            directory: default_directory(),
            max_connections: None,
            read_timeout: None,
            log_level: default_log_level(),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
