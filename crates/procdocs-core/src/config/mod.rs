//! Client configuration.
//!
//! `ClientConfig` is the persisted, user-editable form (JSON file plus
//! environment overrides). `RemoteSettings` is the validated subset needed to
//! build a `SupabaseClient`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Remote table holding process records.
pub const DEFAULT_TABLE: &str = "procesos";

pub const ENV_SUPABASE_URL: &str = "PROCDOCS_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "PROCDOCS_SUPABASE_ANON_KEY";
pub const ENV_TABLE: &str = "PROCDOCS_TABLE";

/// What a sync does when a reachable remote returns zero rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRemotePolicy {
    /// Treat zero rows as "the collection was cleared" and empty the cache
    #[default]
    Wipe,
    /// Merge the empty result like any other, keeping cached records
    Preserve,
}

/// User-facing client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub empty_remote_policy: EmptyRemotePolicy,
    /// Optional HTTP timeout; the transport default applies when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Validated settings for talking to the Supabase project.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for RemoteSettings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteSettings")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Load a config file; a missing file yields the default config.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!(
                "failed to parse config at {}: {error}",
                path.display()
            ))
        })?;
        Ok(config.normalized())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(&self.clone().normalized())?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Apply `PROCDOCS_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = normalize_text_option(lookup(ENV_SUPABASE_URL)) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = normalize_text_option(lookup(ENV_SUPABASE_ANON_KEY)) {
            self.supabase_anon_key = Some(key);
        }
        if let Some(table) = normalize_text_option(lookup(ENV_TABLE)) {
            self.table = Some(table);
        }
        self.normalized()
    }

    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.supabase_url =
            normalize_text_option(self.supabase_url).map(|url| url.trim_end_matches('/').to_string());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key);
        self.table = normalize_text_option(self.table);
        self
    }

    pub fn table_name(&self) -> String {
        normalize_text_option(self.table.clone()).unwrap_or_else(|| DEFAULT_TABLE.to_string())
    }

    pub fn is_remote_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }

    /// Validate the fields needed to reach Supabase.
    pub fn remote_settings(&self) -> Result<RemoteSettings> {
        let url = normalize_text_option(self.supabase_url.clone())
            .ok_or_else(|| Error::Config("supabase_url is required".to_string()))?;
        if !is_http_url(&url) {
            return Err(Error::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
        let anon_key = normalize_text_option(self.supabase_anon_key.clone())
            .ok_or_else(|| Error::Config("supabase_anon_key is required".to_string()))?;
        let table = self.table_name();
        if !table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::Config(format!("invalid table name '{table}'")));
        }

        Ok(RemoteSettings {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            table,
            timeout: self
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}
