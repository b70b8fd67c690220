//! Application configuration
//!
//! Read from the environment with defaults; command-line flags override
//! individual values afterwards.

use std::path::PathBuf;
use tally_ledger::{EnvKeyProvider, FileKeyProvider, KeyProvider};

pub const DATABASE_URL_VAR: &str = "TALLY_DATABASE_URL";
pub const KEY_FILE_VAR: &str = "TALLY_KEY_FILE";
pub const REPORT_DIR_VAR: &str = "TALLY_REPORT_DIR";
pub const ACTOR_VAR: &str = "TALLY_ACTOR";

pub const DEFAULT_DATABASE_URL: &str = "sqlite:tally.db?mode=rwc";
pub const DEFAULT_REPORT_DIR: &str = "./reports";

/// Where the signing key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Hex key in `TALLY_SIGNING_KEY`
    Env,
    /// Hex key in a file
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    /// `None` when neither the key variable nor a key file is configured
    pub key_source: Option<KeySource>,
    pub report_dir: PathBuf,
    pub actor: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            key_source: None,
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            actor: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // the key variable wins over a key file
        let key_source = if get(EnvKeyProvider::DEFAULT_VAR).is_some() {
            Some(KeySource::Env)
        } else {
            get(KEY_FILE_VAR).map(|path| KeySource::File(PathBuf::from(path)))
        };

        let defaults = Self::default();
        Self {
            database_url: get(DATABASE_URL_VAR).unwrap_or(defaults.database_url),
            key_source,
            report_dir: get(REPORT_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.report_dir),
            actor: get(ACTOR_VAR),
        }
    }

    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.database_url = url;
        }
        self
    }

    pub fn with_key_file(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.key_source = Some(KeySource::File(path));
        }
        self
    }

    pub fn with_report_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.report_dir = dir;
        }
        self
    }

    pub fn with_actor(mut self, actor: Option<String>) -> Self {
        if actor.is_some() {
            self.actor = actor;
        }
        self
    }

    pub fn key_provider(&self) -> anyhow::Result<Box<dyn KeyProvider>> {
        match &self.key_source {
            Some(KeySource::Env) => Ok(Box::new(EnvKeyProvider::default())),
            Some(KeySource::File(path)) => Ok(Box::new(FileKeyProvider::new(path))),
            None => anyhow::bail!(
                "No signing key configured: set {} or {} (see `tally keygen`)",
                EnvKeyProvider::DEFAULT_VAR,
                KEY_FILE_VAR
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database_url, "sqlite:tally.db?mode=rwc");
        assert!(config.key_provider().is_err());
    }

    #[test]
    fn test_env_key_wins_over_file() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TALLY_SIGNING_KEY", "00ff"),
            ("TALLY_KEY_FILE", "/etc/tally.key"),
        ]));
        assert_eq!(config.key_source, Some(KeySource::Env));
    }

    #[test]
    fn test_key_file_and_paths() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TALLY_KEY_FILE", "/etc/tally.key"),
            ("TALLY_DATABASE_URL", "sqlite::memory:"),
            ("TALLY_REPORT_DIR", "/tmp/reports"),
            ("TALLY_ACTOR", "alice"),
        ]));
        assert_eq!(
            config.key_source,
            Some(KeySource::File(PathBuf::from("/etc/tally.key")))
        );
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.report_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.actor.as_deref(), Some("alice"));
        assert_eq!(
            config.key_provider().unwrap().source_name(),
            "file:/etc/tally.key"
        );
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TALLY_SIGNING_KEY", "  "),
            ("TALLY_DATABASE_URL", ""),
        ]));
        assert_eq!(config.key_source, None);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_flags_override() {
        let config = AppConfig::from_lookup(lookup(&[("TALLY_ACTOR", "alice")]))
            .with_database_url(Some("sqlite:other.db".to_string()))
            .with_key_file(Some(PathBuf::from("k.hex")))
            .with_report_dir(None)
            .with_actor(Some("bob".to_string()));

        assert_eq!(config.database_url, "sqlite:other.db");
        assert_eq!(config.key_source, Some(KeySource::File(PathBuf::from("k.hex"))));
        assert_eq!(config.report_dir, PathBuf::from(DEFAULT_REPORT_DIR));
        assert_eq!(config.actor.as_deref(), Some("bob"));
    }
}
