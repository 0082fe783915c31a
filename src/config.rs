// Configuration resolution: works out which service to talk to and which
// token to present. Three sources are consulted per value, in order:
// environment variable, config file, built-in default. The result is
// computed once in `main` and handed to every operation that needs it.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the service base URL.
pub const BASE_URL_ENV: &str = "DEVTRANS_BASE_URL";

/// Environment variable overriding the API token.
pub const TOKEN_ENV: &str = "DEVTRANS_TOKEN";

/// Service address used when neither the environment nor the file set one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Errors raised when the resolved configuration cannot serve a request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API token: set {env} or edit {}", path.display())]
    MissingToken { env: &'static str, path: PathBuf },
}

/// Fixed location of the externally managed config file.
pub fn config_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\DevTransClient\config")
    } else {
        PathBuf::from("/opt/DevTransClient/config")
    }
}

/// Values read from the `key=value` config file. A key that appears more
/// than once keeps its last value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

impl ConfigFile {
    /// Read the file at `path`. A missing or unreadable file yields an
    /// empty configuration so the environment and defaults still apply.
    pub fn load(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => Self::parse(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!("config file {} not read: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut file = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "base_url" => file.base_url = Some(value),
                "token" => file.token = Some(value),
                _ => {}
            }
        }
        file
    }
}

/// Resolved settings for one invocation. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    base_url: String,
    token: String,
    file_path: PathBuf,
}

impl Config {
    /// Build a config from explicit values, bypassing every source.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            token: token.into(),
            file_path: config_path(),
        }
    }

    /// Resolve from the process environment and the fixed config file.
    pub fn resolve() -> Self {
        let path = config_path();
        let file = ConfigFile::load(&path);
        Self::resolve_with(|key| std::env::var(key).ok(), &file, path)
    }

    /// Resolve from an arbitrary environment lookup and an already parsed
    /// file. `file_path` is only used to build error messages.
    pub fn resolve_with<F>(env: F, file: &ConfigFile, file_path: PathBuf) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = first_set(env(BASE_URL_ENV), file.base_url.clone())
            .map(|url| normalize_base_url(&url))
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = first_set(env(TOKEN_ENV), file.token.clone()).unwrap_or_default();

        debug!(
            "resolved base_url={} token_present={}",
            base_url,
            !token.is_empty()
        );

        Self {
            base_url,
            token,
            file_path,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token, possibly empty. Use `require_token` for operations that
    /// must authenticate.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn require_token(&self) -> Result<&str, ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::MissingToken {
                env: TOKEN_ENV,
                path: self.file_path.clone(),
            });
        }
        Ok(&self.token)
    }
}

// Empty strings count as unset at every level.
fn first_set(env: Option<String>, file: Option<String>) -> Option<String> {
    env.filter(|v| !v.is_empty())
        .or_else(|| file.filter(|v| !v.is_empty()))
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
