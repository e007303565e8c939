use crate::transport::ClientConfig;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Command-line parsing stopped: a usage error, or `--help` / `--version`.
    /// `clap::Error::exit` prints it the way clap would and picks the exit code.
    #[error("{0}")]
    Cli(#[from] clap::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Output format of the shipper's own logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// How records are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipMode {
    /// One POST per record (destination is the index's document endpoint)
    Single,
    /// Bulk POSTs of `bulk_size` records (destination is the `_bulk` endpoint)
    #[default]
    Bulk,
}

#[derive(Parser, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Destination URL, optionally with `user:pass@` credentials
    #[arg(
        long,
        env = "RASK_SHIPPER_DESTINATION",
        default_value = "http://localhost:9200/logs/_bulk"
    )]
    pub destination: String,

    /// Delivery mode
    #[arg(long, env = "RASK_SHIPPER_MODE", default_value = "bulk")]
    pub mode: ShipMode,

    /// Records per bulk request
    #[arg(long, env = "RASK_SHIPPER_BULK_SIZE", default_value = "500")]
    pub bulk_size: usize,

    /// Request timeout in seconds (no timeout when unset)
    #[arg(long, env = "RASK_SHIPPER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Connection timeout in seconds (no timeout when unset)
    #[arg(long, env = "RASK_SHIPPER_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// User agent sent with every request
    #[arg(long, env = "RASK_SHIPPER_USER_AGENT", default_value_t = default_user_agent())]
    pub user_agent: String,

    /// Host name written into documents (detected when unset)
    #[arg(long, env = "RASK_SHIPPER_HOST_NAME")]
    pub host_name: Option<String>,

    /// NDJSON file of raw records (stdin when unset)
    #[arg(long, env = "RASK_SHIPPER_INPUT")]
    pub input: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "RASK_SHIPPER_CONFIG")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination: "http://localhost:9200/logs/_bulk".to_string(),
            mode: ShipMode::Bulk,
            bulk_size: 500,
            timeout_secs: None,
            connect_timeout_secs: None,
            user_agent: default_user_agent(),
            host_name: None,
            input: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
        }
    }
}

impl Config {
    /// CLI arguments and environment only.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::try_parse_from(args)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// CLI arguments and environment, layered over the configuration file
    /// when one is given.
    ///
    /// Precedence per setting: command line, then environment, then file,
    /// then built-in default. A value given explicitly wins even when it
    /// equals the default.
    pub fn load<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Config::command().try_get_matches_from(args)?;
        let cli = Config::from_arg_matches(&matches)?;

        let Some(path) = cli.config_file.clone() else {
            cli.validate()?;
            return Ok(cli);
        };

        let content = std::fs::read_to_string(&path)?;
        let file: Config = toml::from_str(&content)?;
        let config = cli.merged_over(file, &matches);
        config.validate()?;
        Ok(config)
    }

    fn merged_over(self, file: Config, matches: &ArgMatches) -> Config {
        let explicit = |id: &str| {
            matches!(
                matches.value_source(id),
                Some(ValueSource::CommandLine | ValueSource::EnvVariable)
            )
        };
        Config {
            destination: pick(explicit("destination"), self.destination, file.destination),
            mode: pick(explicit("mode"), self.mode, file.mode),
            bulk_size: pick(explicit("bulk_size"), self.bulk_size, file.bulk_size),
            timeout_secs: self.timeout_secs.or(file.timeout_secs),
            connect_timeout_secs: self.connect_timeout_secs.or(file.connect_timeout_secs),
            user_agent: pick(explicit("user_agent"), self.user_agent, file.user_agent),
            host_name: self.host_name.or(file.host_name),
            input: self.input.or(file.input),
            log_level: pick(explicit("log_level"), self.log_level, file.log_level),
            log_format: pick(explicit("log_format"), self.log_format, file.log_format),
            config_file: self.config_file,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.destination_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Unsupported scheme '{}' in destination; expected http or https",
                url.scheme()
            )));
        }

        if self.bulk_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Bulk size must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "User agent cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn destination_url(&self) -> Result<Url, ConfigError> {
        // Credentials are part of the URL, so the error never echoes it back.
        Url::parse(&self.destination)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid destination URL: {e}")))
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.timeout_secs.map(Duration::from_secs),
            connection_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_user_agent() -> String {
    format!("rask-log-shipper/{}", env!("CARGO_PKG_VERSION"))
}

fn pick<T>(explicit: bool, cli: T, file: T) -> T {
    if explicit { cli } else { file }
}
