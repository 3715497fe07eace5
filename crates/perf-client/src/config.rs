// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use perf_core::PerfError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides [`ClientConfig::base_url`].
pub const URL_ENV_VAR: &str = "PERFDASH_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const MAX_TIMEOUT_MS: u64 = 600_000;

/// Configuration for [`crate::RemoteApiClient`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Server root, without a trailing slash.
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: concat!("perfdash/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), PerfError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PerfError::invalid_input(format!(
                "base_url must start with http:// or https://; got '{}'",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(PerfError::invalid_input(format!(
                "timeout_ms must be in 1..={MAX_TIMEOUT_MS}; got {}",
                self.timeout_ms
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(PerfError::invalid_input("user_agent must not be empty"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `base_url` joined with `path`, which must start with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim().trim_end_matches('/'))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, PerfError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| PerfError::invalid_input(format!("invalid client config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PerfError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            PerfError::invalid_input(format!("failed to read '{}': {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Applies overrides read through `lookup`, then validates.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, PerfError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(URL_ENV_VAR).filter(|url| !url.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self.validate()?;
        Ok(self)
    }

    /// Optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, PerfError> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }
}
