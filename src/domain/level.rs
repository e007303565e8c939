use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a raw log record.
///
/// Serialized and displayed by upper-case name (`INFO`, `WARN`, ...), which is
/// also the form written into the document's `level` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn display_name(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" | "verbose" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" | "information" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" | "critical" => Ok(Level::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display_names() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Fatal.display_name(), "FATAL");
    }

    #[test]
    fn test_level_parsing_is_case_insensitive() {
        assert_eq!("Warning".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("ERROR".parse::<Level>().unwrap(), Level::Error);
        assert_eq!(" info ".parse::<Level>().unwrap(), Level::Info);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_serializes_by_name() {
        assert_eq!(serde_json::to_string(&Level::Debug).unwrap(), "\"DEBUG\"");
    }
}
