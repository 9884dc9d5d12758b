// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration module - loads the JSON config file and API settings.

use crate::error::{Result, TrailError};
use crate::position::TrailingDistance;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.darwinex.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trailing rule for one Darwin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingRule {
    #[serde(default)]
    pub name: String,
    /// Absolute distance (`46.5`) or percentage (`2.53%`).
    #[serde(rename = "trailingSL", default)]
    pub trailing_sl: String,
}

impl TrailingRule {
    pub fn distance(&self) -> Result<TrailingDistance> {
        self.trailing_sl.parse()
    }
}

/// OAuth credentials for the Darwinex API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[serde(rename = "authtoken")]
    pub access_token: String,
    #[serde(rename = "refreshtoken")]
    pub refresh_token: String,
    #[serde(rename = "consumerkey")]
    pub consumer_key: String,
    #[serde(rename = "consumersecret")]
    pub consumer_secret: String,
}

/// Contents of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub credentials: Credentials,
    /// `0` means not set.
    #[serde(rename = "investorid", default)]
    pub investor_id: u64,
    #[serde(default)]
    pub darwins: Vec<TrailingRule>,
}

impl Config {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| TrailError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check credentials and rules before anything touches the network.
    pub fn validate(&self) -> Result<()> {
        let creds = &self.credentials;
        for (field, value) in [
            ("authtoken", &creds.access_token),
            ("refreshtoken", &creds.refresh_token),
            ("consumerkey", &creds.consumer_key),
            ("consumersecret", &creds.consumer_secret),
        ] {
            if value.is_empty() {
                return Err(TrailError::ConfigInvalid(format!("{} is empty", field)));
            }
        }

        if self.darwins.is_empty() {
            return Err(TrailError::ConfigInvalid("no darwins configured".to_string()));
        }

        for rule in &self.darwins {
            if rule.name.is_empty() {
                return Err(TrailError::ConfigInvalid(
                    "darwin entry with empty name".to_string(),
                ));
            }
            rule.distance()?;
        }

        Ok(())
    }

    pub fn investor_id(&self) -> Option<u64> {
        (self.investor_id != 0).then_some(self.investor_id)
    }
}

/// Somewhere refreshed credentials can be written back to.
pub trait CredentialStore {
    fn save(&self, config: &Config) -> Result<()>;
}

/// The config file itself, rewritten in full on every save.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Create `path` readable by the owner only, then fill it. The mode is set at
/// creation so the tokens are never on disk with wider permissions.
fn write_owner_only(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // A leftover tmp file keeps its old mode, so tighten it explicitly.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()
}

impl CredentialStore for ConfigFile {
    fn save(&self, config: &Config) -> Result<()> {
        let write_err = |source: std::io::Error| TrailError::ConfigWrite {
            path: self.path.display().to_string(),
            source,
        };

        let json = serde_json::to_string_pretty(config).map_err(TrailError::ConfigSerialize)?;

        // Write a sibling file and rename it over the config, so a crash never
        // leaves a half-written file behind the single-use refresh token.
        let tmp = self.tmp_path();
        let written = write_owner_only(&tmp, json.as_bytes())
            .and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(e));
        }

        Ok(())
    }
}

/// Where and how to reach the API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiSettings {
    /// Load overrides from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let timeout_secs = env_var_or("DARWINEX_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| TrailError::ConfigInvalid("invalid DARWINEX_TIMEOUT_SECS".to_string()))?;

        Ok(Self {
            base_url: env_var_or("DARWINEX_API_URL", DEFAULT_API_URL),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env_var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "authtoken": "a",
        "refreshtoken": "r",
        "consumerkey": "k",
        "consumersecret": "s",
        "investorid": 42,
        "darwins": [
            {"name": "EURUSD", "trailingSL": "46.5"},
            {"name": "SYO", "trailingSL": "2.53%"}
        ]
    }"#;

    fn write(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&write(&dir, VALID)).unwrap();

        assert_eq!(config.credentials.access_token, "a");
        assert_eq!(config.credentials.consumer_secret, "s");
        assert_eq!(config.investor_id(), Some(42));
        assert_eq!(
            config.darwins[1].distance().unwrap(),
            TrailingDistance::Percent(2.53)
        );
    }

    #[test]
    fn missing_investor_id_is_unset() {
        let config: Config = serde_json::from_str(
            r#"{"authtoken":"a","refreshtoken":"r","consumerkey":"k","consumersecret":"s",
                "darwins":[{"name":"EURUSD","trailingSL":"5"}]}"#,
        )
        .unwrap();
        assert_eq!(config.investor_id(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_trailing_rule() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, &VALID.replace("2.53%", "abc"));
        assert!(matches!(
            Config::load(&path),
            Err(TrailError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn rejects_empty_credentials_and_rules() {
        let dir = tempfile::tempdir().unwrap();

        let path = write(&dir, &VALID.replace(r#""consumerkey": "k""#, r#""consumerkey": """#));
        assert!(matches!(
            Config::load(&path),
            Err(TrailError::ConfigInvalid(_))
        ));

        let mut config: Config = serde_json::from_str(VALID).unwrap();
        config.darwins.clear();
        assert!(matches!(config.validate(), Err(TrailError::ConfigInvalid(_))));

        let mut config: Config = serde_json::from_str(VALID).unwrap();
        config.darwins[0].name.clear();
        assert!(matches!(config.validate(), Err(TrailError::ConfigInvalid(_))));
    }

    #[test]
    fn unparseable_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(&write(&dir, "{not json")),
            Err(TrailError::ConfigParse(_))
        ));
    }

    #[test]
    fn save_writes_full_config_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigFile::new(dir.path().join("saved.json"));
        let config: Config = serde_json::from_str(VALID).unwrap();

        store.save(&config).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"authtoken\""));
        assert!(raw.contains("\"trailingSL\""));
        assert_eq!(Config::load(store.path()).unwrap(), config);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[test]
    fn save_replaces_world_readable_file_atomically() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, VALID);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = ConfigFile::new(&path);
        let mut config: Config = serde_json::from_str(VALID).unwrap();
        config.credentials.refresh_token = "rotated".to_string();
        store.save(&config).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(Config::load(&path).unwrap().credentials.refresh_token, "rotated");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("config.json")]);
    }

    #[test]
    fn save_into_missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigFile::new(dir.path().join("missing").join("config.json"));
        let config: Config = serde_json::from_str(VALID).unwrap();
        assert!(matches!(
            store.save(&config),
            Err(TrailError::ConfigWrite { .. })
        ));
    }
}
