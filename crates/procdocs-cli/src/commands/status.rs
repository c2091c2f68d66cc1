use procdocs_core::auth::load_stored_session;
use procdocs_core::cache::RecordCache;
use procdocs_core::config::EmptyRemotePolicy;
use procdocs_core::remote::{ConnectivityProbe, SupabaseClient};
use serde::Serialize;

use crate::commands::common::{format_timestamp, Context};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub db_path: String,
    pub config_path: String,
    pub remote_configured: bool,
    pub remote_url: Option<String>,
    pub table: String,
    pub empty_remote_policy: EmptyRemotePolicy,
    /// `None` when no remote is configured
    pub reachable: Option<bool>,
    pub cached_records: usize,
    pub local_records: usize,
    pub last_synced_at: String,
    pub signed_in_as: Option<String>,
}

pub async fn run_status(as_json: bool, context: &Context) -> Result<(), CliError> {
    let report = collect_status(context).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_status_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn collect_status(context: &Context) -> Result<StatusReport, CliError> {
    let config = context.load_config()?;
    let store = context.open_store().await?;
    let cache = RecordCache::new(store.clone());
    let records = cache.load().await;

    let client = if config.is_remote_configured() {
        Some(SupabaseClient::new(&config.remote_settings()?)?)
    } else {
        None
    };
    let reachable = match &client {
        Some(client) => Some(client.is_reachable().await),
        None => None,
    };
    let session = load_stored_session(&store).await?;

    Ok(StatusReport {
        db_path: context.db_path.display().to_string(),
        config_path: context.config_path.display().to_string(),
        remote_configured: client.is_some(),
        remote_url: client.as_ref().map(|client| client.base_url().to_string()),
        table: client
            .as_ref()
            .map_or_else(|| config.table_name(), |client| client.table().to_string()),
        empty_remote_policy: config.empty_remote_policy,
        reachable,
        cached_records: records.len(),
        local_records: records.iter().filter(|record| record.is_local()).count(),
        last_synced_at: format_timestamp(cache.last_sync_timestamp().await),
        signed_in_as: session.map(|session| session.user.email.unwrap_or(session.user.id)),
    })
}

pub fn format_status_lines(report: &StatusReport) -> Vec<String> {
    let connectivity = match report.reachable {
        None => "not configured",
        Some(true) => "online",
        Some(false) => "offline",
    };
    let remote_url = report.remote_url.as_deref().unwrap_or("-");
    vec![
        format!("Remote:     {connectivity} {remote_url} (table '{}')", report.table),
        format!(
            "Cache:      {} processes ({} local)",
            report.cached_records, report.local_records
        ),
        format!("Last sync:  {}", report.last_synced_at),
        format!(
            "Signed in:  {}",
            report.signed_in_as.as_deref().unwrap_or("no")
        ),
        format!("Database:   {}", report.db_path),
        format!("Config:     {}", report.config_path),
    ]
}
