//! Environment-backed runtime configuration for `palaver-shell`.

use std::{
    env,
    error::Error,
    fmt,
    path::{Path, PathBuf},
};

const DEFAULT_DATA_DIR: &str = "./.palaver-shell-store";
const DEFAULT_EVENT_BUFFER: usize = 64;
const DEFAULT_NOTICE_BUFFER: usize = 16;

/// Runtime configuration used by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Data directory holding the snapshot files.
    pub data_dir: PathBuf,
    /// Current user id, when provided; only used for log context.
    pub user_id: Option<String>,
    /// Event channel buffer size.
    pub event_buffer: usize,
    /// Notice broadcast buffer size.
    pub notice_buffer: usize,
}

impl ShellConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let data_dir = optional_trimmed_env("PALAVER_DATA_DIR", &mut lookup)
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(DEFAULT_DATA_DIR).to_path_buf());
        let user_id = optional_trimmed_env("PALAVER_USER", &mut lookup);
        let event_buffer =
            parse_optional_usize("PALAVER_EVENT_BUFFER", DEFAULT_EVENT_BUFFER, &mut lookup)?;
        let notice_buffer =
            parse_optional_usize("PALAVER_NOTICE_BUFFER", DEFAULT_NOTICE_BUFFER, &mut lookup)?;

        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PALAVER_EVENT_BUFFER",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        if notice_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PALAVER_NOTICE_BUFFER",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(Self {
            data_dir,
            user_id,
            event_buffer,
            notice_buffer,
        })
    }
}

/// Errors produced while parsing runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}='{value}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_optional_usize<F>(
    key: &'static str,
    default: usize,
    lookup: &mut F,
) -> Result<usize, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .parse::<usize>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl FnMut(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn falls_back_to_defaults_without_env() {
        let config = ShellConfig::from_lookup(lookup_from(&[])).expect("defaults should parse");
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.user_id, None);
        assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER);
        assert_eq!(config.notice_buffer, DEFAULT_NOTICE_BUFFER);
    }

    #[test]
    fn reads_overrides_from_env() {
        let config = ShellConfig::from_lookup(lookup_from(&[
            ("PALAVER_DATA_DIR", "/tmp/palaver"),
            ("PALAVER_USER", "u-7"),
            ("PALAVER_EVENT_BUFFER", "128"),
        ]))
        .expect("overrides should parse");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/palaver"));
        assert_eq!(config.user_id.as_deref(), Some("u-7"));
        assert_eq!(config.event_buffer, 128);
    }

    #[test]
    fn rejects_unparseable_buffer_size() {
        let err = ShellConfig::from_lookup(lookup_from(&[("PALAVER_EVENT_BUFFER", "lots")]))
            .expect_err("non-numeric buffer should be rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "PALAVER_EVENT_BUFFER",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_buffer_size() {
        let err = ShellConfig::from_lookup(lookup_from(&[("PALAVER_NOTICE_BUFFER", "0")]))
            .expect_err("zero buffer should be rejected");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
