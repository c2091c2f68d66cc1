use procdocs_core::{SyncOutcome, SyncStatus};

use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_sync(as_json: bool, context: &Context) -> Result<(), CliError> {
    let remote = context.connect().await?;
    let outcome = remote.synchronizer().synchronize().await;
    tracing::debug!("Sync finished in state {}", outcome.state().label());

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", format_sync_summary(&outcome));
    }
    Ok(())
}

/// One-line human summary of a synchronization run.
pub fn format_sync_summary(outcome: &SyncOutcome) -> String {
    let count = outcome.records.len();
    let mut summary = match outcome.status {
        SyncStatus::Offline => format!("Offline: showing {count} cached processes"),
        SyncStatus::Degraded => format!(
            "Sync failed ({}): showing {count} cached processes",
            outcome.error.as_deref().unwrap_or("unknown error")
        ),
        SyncStatus::Cleared => format!(
            "Remote table is empty: cleared {} cached processes",
            outcome.delta.unsigned_abs()
        ),
        SyncStatus::Synced => format!("Synced {count} processes ({:+})", outcome.delta),
    };
    if outcome.rejected_rows > 0 {
        summary.push_str(&format!(
            "; skipped {} malformed remote rows",
            outcome.rejected_rows
        ));
    }
    summary
}
