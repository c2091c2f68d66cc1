use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use procdocs_core::auth::{AuthSession, SupabaseAuthClient};
use procdocs_core::cache::RecordCache;
use procdocs_core::config::ClientConfig;
use procdocs_core::db::LibSqlKeyValueStore;
use procdocs_core::models::ImageSource;
use procdocs_core::remote::SupabaseClient;
use procdocs_core::services::ProcessService;
use procdocs_core::{Record, Synchronizer};
use serde::Serialize;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "procdocs.db";

pub type AppSynchronizer = Synchronizer<LibSqlKeyValueStore, SupabaseClient, SupabaseClient>;
pub type AppProcessService =
    ProcessService<SupabaseClient, LibSqlKeyValueStore, SupabaseClient, SupabaseClient>;

/// Where this invocation keeps its database and config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl Context {
    pub fn resolve(
        cli_db_path: Option<PathBuf>,
        cli_config_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        Ok(Self {
            db_path: resolve_db_path(cli_db_path)?,
            config_path: match cli_config_path {
                Some(path) => path,
                None => default_config_path()?,
            },
        })
    }

    /// Config file contents with `PROCDOCS_*` environment overrides applied.
    pub fn load_config(&self) -> Result<ClientConfig, CliError> {
        Ok(ClientConfig::load_from_path(&self.config_path)?.with_env_overrides())
    }

    pub async fn open_store(&self) -> Result<LibSqlKeyValueStore, CliError> {
        Ok(LibSqlKeyValueStore::open(&self.db_path).await?)
    }

    pub async fn open_cache(&self) -> Result<RecordCache<LibSqlKeyValueStore>, CliError> {
        Ok(RecordCache::new(self.open_store().await?))
    }

    /// Connect to the configured project, acting as the stored user if any.
    pub async fn connect(&self) -> Result<Remote, CliError> {
        let config = self.load_config()?;
        if !config.is_remote_configured() {
            return Err(CliError::RemoteNotConfigured);
        }
        let client = SupabaseClient::new(&config.remote_settings()?)?;
        let store = self.open_store().await?;

        let session = SupabaseAuthClient::new(client.clone(), store.clone())
            .restore_session()
            .await?;
        let client = match &session {
            Some(session) => client.with_access_token(session.access_token.clone()),
            None => client,
        };

        Ok(Remote {
            config,
            store,
            client,
            session,
        })
    }
}

/// A configured Supabase connection plus the local store.
pub struct Remote {
    pub config: ClientConfig,
    pub store: LibSqlKeyValueStore,
    pub client: SupabaseClient,
    pub session: Option<AuthSession>,
}

impl Remote {
    pub fn synchronizer(&self) -> AppSynchronizer {
        Synchronizer::new(
            RecordCache::new(self.store.clone()),
            self.client.clone(),
            self.client.clone(),
        )
        .with_empty_remote_policy(self.config.empty_remote_policy)
    }

    pub fn process_service(&self) -> AppProcessService {
        ProcessService::new(self.client.clone(), self.synchronizer())
    }

    pub fn auth_client(&self) -> SupabaseAuthClient<LibSqlKeyValueStore> {
        SupabaseAuthClient::new(self.client.clone(), self.store.clone())
    }
}

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub origin: &'static str,
    pub image_count: usize,
    pub image_bytes: u64,
    pub created_at: String,
    pub updated_at: String,
    pub relative_time: String,
}

pub fn record_to_list_item(record: &Record) -> RecordListItem {
    RecordListItem {
        id: record.id.clone(),
        title: record.title.clone(),
        description: record.description.clone(),
        origin: record.origin.as_str(),
        image_count: record.images.len(),
        image_bytes: record.total_image_size(),
        created_at: record.created_at.to_rfc3339(),
        updated_at: record.updated_at.to_rfc3339(),
        relative_time: format_relative_time(record.updated_at, Utc::now()),
    }
}

pub fn format_record_lines(records: &[Record]) -> Vec<String> {
    let now = Utc::now();
    records
        .iter()
        .map(|record| {
            let short_id = record.id.chars().take(13).collect::<String>();
            let title = title_preview(&record.title, 40);
            let relative_time = format_relative_time(record.updated_at, now);
            format!(
                "{short_id:<13}  {:<6}  {title:<40}  {relative_time}",
                record.origin.as_str()
            )
        })
        .collect()
}

/// Multi-line detail view of one record.
pub fn format_record_detail(record: &Record) -> String {
    let mut lines = vec![
        record.title.clone(),
        format!("  id:       {}", record.id),
        format!("  origin:   {}", record.origin.as_str()),
        format!("  created:  {}", format_timestamp(record.created_at)),
        format!("  updated:  {}", format_timestamp(record.updated_at)),
    ];
    if let Some(created_by) = &record.created_by {
        lines.push(format!("  author:   {created_by}"));
    }
    lines.push(String::new());
    lines.extend(record.description.lines().map(|line| format!("  {line}")));
    if !record.images.is_empty() {
        lines.push(String::new());
        for image in &record.images {
            lines.push(match image.source() {
                ImageSource::Bundled(asset_id) => {
                    format!("  [bundled] {} ({asset_id})", image.name)
                }
                ImageSource::Encoded(_) => {
                    format!("  [inline] {} ({} bytes)", image.name, image.size)
                }
            });
        }
    }
    lines.join("\n")
}

pub fn title_preview(title: &str, max_chars: usize) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(timestamp).num_seconds().max(0);
    let minute = 60;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Exact id match, otherwise every record whose title contains `query`.
pub fn find_records<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
    if let Some(record) = records.iter().find(|record| record.id == query) {
        return vec![record];
    }
    records
        .iter()
        .filter(|record| record.matches_title(query))
        .collect()
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("PROCDOCS_DB_PATH").map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("procdocs").join(DB_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve data directory".to_string()))
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("procdocs").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}
