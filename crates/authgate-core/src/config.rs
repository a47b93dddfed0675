//! Gateway configuration management.
//!
//! Configuration is read once at startup and shared read-only by every stage
//! of the request pipeline. It is stored at `~/.config/authgate/config.json`
//! by default; any field missing from the file takes its default value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "authgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_COOLDOWN_MS: u64 = 1000;
const DEFAULT_UNAUTHORIZED_STATUS: u16 = 401;

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Navigation prefixes that belong to the authentication flow itself.
const DEFAULT_EXEMPT_PATHS: [&str; 4] = ["/login", "/signup", "/forgot-password", "/reset-password"];

/// Ordered set of path prefixes where unauthorized responses never force
/// a recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExemptPathSet(Vec<String>);

impl ExemptPathSet {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: Vec<String> = Vec::new();
        for prefix in prefixes {
            let prefix = prefix.into();
            if !prefix.is_empty() && !set.contains(&prefix) {
                set.push(prefix);
            }
        }
        Self(set)
    }

    /// Prefix match of `path` against every entry.
    pub fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ExemptPathSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXEMPT_PATHS)
    }
}

impl From<Vec<String>> for ExemptPathSet {
    fn from(prefixes: Vec<String>) -> Self {
        Self::new(prefixes)
    }
}

impl From<ExemptPathSet> for Vec<String> {
    fn from(set: ExemptPathSet) -> Self {
        set.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Backend base address every request path is joined onto.
    pub base_url: String,
    /// Login entry point that recovery redirects to.
    pub login_path: String,
    pub exempt_paths: ExemptPathSet,
    /// Minimum time between the starts of two recovery sequences.
    pub cooldown_ms: u64,
    pub unauthorized_status: u16,
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            exempt_paths: ExemptPathSet::default(),
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            unauthorized_status: DEFAULT_UNAUTHORIZED_STATUS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    /// Load from the platform config directory.
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::config_path()?)
    }

    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from `AUTHGATE_*` environment variables.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(base_url) = std::env::var("AUTHGATE_BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(login_path) = std::env::var("AUTHGATE_LOGIN_PATH") {
            self.login_path = login_path;
        }
        if let Ok(cooldown) = std::env::var("AUTHGATE_COOLDOWN_MS") {
            self.cooldown_ms = cooldown
                .parse()
                .with_context(|| format!("AUTHGATE_COOLDOWN_MS is not a number: {}", cooldown))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.base_url))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("base_url must be an absolute http(s) address: {}", self.base_url);
        }
        if !self.login_path.starts_with('/') {
            anyhow::bail!("login_path must start with '/': {}", self.login_path);
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.cooldown(), Duration::from_millis(1000));
        assert_eq!(config.unauthorized_status, 401);
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.exempt_paths.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_exempt_paths_prefix_match() {
        let exempt = ExemptPathSet::default();
        assert!(exempt.matches("/reset-password/abc"));
        assert!(exempt.matches("/login"));
        assert!(exempt.matches("/signup?plan=pro"));
        assert!(!exempt.matches("/dashboard"));
        assert!(!exempt.matches("/settings/login"));
    }

    #[test]
    fn test_exempt_paths_keep_order_and_drop_duplicates() {
        let exempt = ExemptPathSet::new(["/b", "/a", "/b", ""]);
        assert_eq!(exempt.iter().collect::<Vec<_>>(), vec!["/b", "/a"]);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"base_url": "https://api.example.com", "cooldown_ms": 250}"#)
                .unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.cooldown_ms, 250);
        assert_eq!(config.exempt_paths, ExemptPathSet::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = GatewayConfig {
            exempt_paths: ExemptPathSet::new(["/auth"]),
            ..GatewayConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = GatewayConfig::load(&path).unwrap();
        assert_eq!(loaded.exempt_paths, ExemptPathSet::new(["/auth"]));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    // The only test touching AUTHGATE_* variables, so nothing races on them
    #[test]
    fn test_apply_env_overrides() {
        const VARS: [&str; 3] = ["AUTHGATE_BASE_URL", "AUTHGATE_LOGIN_PATH", "AUTHGATE_COOLDOWN_MS"];

        std::env::set_var("AUTHGATE_BASE_URL", "https://api.example.com");
        std::env::set_var("AUTHGATE_LOGIN_PATH", "/sign-in");
        std::env::set_var("AUTHGATE_COOLDOWN_MS", "250");
        let config = GatewayConfig::default().apply_env();

        std::env::set_var("AUTHGATE_COOLDOWN_MS", "soon");
        let bad_cooldown = GatewayConfig::default().apply_env();

        std::env::set_var("AUTHGATE_COOLDOWN_MS", "250");
        std::env::set_var("AUTHGATE_LOGIN_PATH", "sign-in");
        let bad_login = GatewayConfig::default().apply_env();

        for var in VARS {
            std::env::remove_var(var);
        }

        let config = config.unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.login_path, "/sign-in");
        assert_eq!(config.cooldown(), Duration::from_millis(250));

        let err = bad_cooldown.unwrap_err();
        assert!(err.to_string().contains("AUTHGATE_COOLDOWN_MS is not a number"));
        assert!(bad_login.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = GatewayConfig {
            base_url: "not a url".into(),
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GatewayConfig {
            login_path: "login".into(),
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
