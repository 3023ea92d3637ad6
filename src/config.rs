//! Configuration loader and validator for the channel watcher.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub api: Api,
    pub email: Email,
    pub watch: Watch,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub state_path: String,
    pub poll_interval_secs: u64,
}

/// YouTube Data API settings. The key may be left empty here and supplied
/// through `VIDWATCH_API_KEY` instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    #[serde(default)]
    pub key: String,
}

/// SMTP submission settings. The sender address doubles as the SMTP login.
/// The password may be left empty here and supplied through
/// `VIDWATCH_SMTP_PASSWORD` instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Email {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    #[serde(default)]
    pub password: String,
}

/// The watch lists: which channels to poll and who gets alerted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Watch {
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl Watch {
    /// Returns false for empty or already-present ids.
    pub fn add_channel(&mut self, id: &str) -> bool {
        add_entry(&mut self.channels, id)
    }

    /// Returns false when the id was not on the list.
    pub fn remove_channel(&mut self, id: &str) -> bool {
        remove_entry(&mut self.channels, id)
    }

    /// Returns false for empty or already-present addresses.
    pub fn add_recipient(&mut self, address: &str) -> bool {
        add_entry(&mut self.recipients, address)
    }

    /// Returns false when the address was not on the list.
    pub fn remove_recipient(&mut self, address: &str) -> bool {
        remove_entry(&mut self.recipients, address)
    }
}

fn add_entry(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

fn remove_entry(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    let before = list.len();
    list.retain(|v| v != value);
    list.len() != before
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Write a configuration back to its YAML file (used by the list-editing
/// commands).
pub fn save(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    validate(cfg)?;
    let content = serde_yaml::to_string(cfg)?;
    fs::write(path, content)?;
    Ok(())
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.state_path.trim().is_empty() {
        return Err(ConfigError::Invalid("app.state_path must be non-empty"));
    }
    if cfg.app.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid("app.poll_interval_secs must be > 0"));
    }

    if cfg.email.smtp_host.trim().is_empty() {
        return Err(ConfigError::Invalid("email.smtp_host must be non-empty"));
    }
    if cfg.email.smtp_port == 0 {
        return Err(ConfigError::Invalid("email.smtp_port must be > 0"));
    }
    if cfg.email.from_address.trim().is_empty() {
        return Err(ConfigError::Invalid("email.from_address must be non-empty"));
    }

    // api.key and email.password may be empty; the environment can supply them.

    Ok(())
}

/// Example YAML config, also written by `vidwatch init`.
pub fn example() -> &'static str {
    r#"app:
  state_path: "./videos.json"
  poll_interval_secs: 900

api:
  key: "YOUR_YOUTUBE_API_KEY"

email:
  smtp_host: "smtp.gmail.com"
  smtp_port: 587
  from_address: "alerts@example.com"
  password: ""

watch:
  channels:
    - "UC_x5XG1OV2P6uZZ5FSM9Ttw"
  recipients:
    - "you@example.com"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
    }

    #[test]
    fn invalid_state_path() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.state_path = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("state_path")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_poll_interval() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.poll_interval_secs = 0;
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("poll_interval_secs")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_email_settings() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.email.smtp_host = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.email.smtp_port = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.email.from_address = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_secrets_are_allowed() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.key = "".into();
        cfg.email.password = "".into();
        validate(&cfg).unwrap();
    }

    #[test]
    fn watch_list_add_and_remove() {
        let mut watch = Watch::default();
        assert!(watch.add_channel("UCabc"));
        assert!(!watch.add_channel("UCabc"));
        assert!(!watch.add_channel("   "));
        assert!(watch.add_channel("  UCdef "));
        assert_eq!(watch.channels, vec!["UCabc", "UCdef"]);

        assert!(watch.remove_channel("UCabc"));
        assert!(!watch.remove_channel("UCabc"));
        assert_eq!(watch.channels, vec!["UCdef"]);

        assert!(watch.add_recipient("a@example.com"));
        assert!(!watch.add_recipient("a@example.com"));
        assert!(watch.remove_recipient("a@example.com"));
        assert!(watch.recipients.is_empty());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.watch.channels, vec!["UC_x5XG1OV2P6uZZ5FSM9Ttw"]);
        assert_eq!(cfg.watch.recipients, vec!["you@example.com"]);
    }

    #[test]
    fn save_round_trips() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.watch.add_channel("UCextra");
        save(&p, &cfg).unwrap();
        let reloaded = load(Some(&p)).unwrap();
        assert_eq!(reloaded, cfg);
    }
}
