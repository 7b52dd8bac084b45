// Coordinator configuration (draft.toml).

use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "DRAFT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "draft.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The one identity allowed to start the draft.
    pub admin_username: String,
    pub snapshot_path: PathBuf,
    pub listeners: Vec<ListenerConfig>,
}

/// One listening socket. Every listener serves the same routes and all of
/// them receive every broadcast.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    pub name: String,
    pub addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            snapshot_path: PathBuf::from("data/draft_state.json"),
            listeners: vec![ListenerConfig {
                name: "public".to_string(),
                addr: "0.0.0.0:3000".to_string(),
            }],
        }
    }
}

impl ListenerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.addr.parse().map_err(|e| ConfigError::ValidationError {
            field: format!("listeners.{}.addr", self.name),
            message: format!("{:?} is not a socket address: {}", self.addr, e),
        })
    }
}

impl Config {
    /// Reads the file named by `DRAFT_CONFIG`, falling back to `draft.toml`.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }

    /// A missing file yields the defaults; anything present must parse and
    /// validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_username.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "admin_username".into(),
                message: "must not be empty".into(),
            });
        }

        if self.listeners.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "listeners".into(),
                message: "at least one listener is required".into(),
            });
        }

        let mut names = HashSet::new();
        for listener in &self.listeners {
            if !names.insert(listener.name.as_str()) {
                return Err(ConfigError::ValidationError {
                    field: "listeners".into(),
                    message: format!("duplicate listener name {:?}", listener.name),
                });
            }
            listener.socket_addr()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Config, ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.toml");
        std::fs::write(&path, raw).unwrap();
        Config::load(&path)
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.listeners.len(), 1);
        assert_eq!(config.snapshot_path, PathBuf::from("data/draft_state.json"));
    }

    #[test]
    fn parses_multiple_listeners() {
        let config = parse(
            r#"
            admin_username = "shark"
            snapshot_path = "/tmp/draft.json"

            [[listeners]]
            name = "plain"
            addr = "0.0.0.0:3000"

            [[listeners]]
            name = "secure"
            addr = "127.0.0.1:3443"
            "#,
        )
        .unwrap();

        assert_eq!(config.admin_username, "shark");
        let names: Vec<_> = config.listeners.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["plain", "secure"]);
        assert_eq!(config.listeners[1].socket_addr().unwrap().port(), 3443);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse(r#"admin_username = "shark""#).unwrap();
        assert_eq!(config.listeners[0].name, "public");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(r#"admin_username = "  ""#),
            Err(ConfigError::ValidationError { ref field, .. }) if field == "admin_username"
        ));
        assert!(matches!(
            parse("listeners = []"),
            Err(ConfigError::ValidationError { ref field, .. }) if field == "listeners"
        ));
        assert!(matches!(
            parse(
                r#"
                [[listeners]]
                name = "a"
                addr = "localhost"
                "#
            ),
            Err(ConfigError::ValidationError { .. })
        ));
        assert!(matches!(
            parse(
                r#"
                [[listeners]]
                name = "a"
                addr = "127.0.0.1:1"
                [[listeners]]
                name = "a"
                addr = "127.0.0.1:2"
                "#
            ),
            Err(ConfigError::ValidationError { .. })
        ));
        assert!(matches!(parse("admin_username = ["), Err(ConfigError::ParseError { .. })));
    }
}
