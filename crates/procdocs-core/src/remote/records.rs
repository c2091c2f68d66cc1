//! PostgREST access to the records table

use reqwest::Response;

use super::{ConnectivityProbe, RemoteRecordSink, RemoteRecordSource, SupabaseClient};
use crate::error::{Error, Result};
use crate::models::{NewRemoteRecord, RemoteRecord, RemoteSnapshot};
use crate::util::parse_api_error;

impl ConnectivityProbe for SupabaseClient {
    async fn is_reachable(&self) -> bool {
        let request = self.authorize(
            self.http()
                .get(self.table_url())
                .query(&[("select", "id"), ("limit", "1")]),
        );

        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!("Reachability probe got HTTP {}", response.status());
                false
            }
            Err(error) => {
                tracing::debug!("Reachability probe failed: {}", error);
                false
            }
        }
    }
}

impl RemoteRecordSource for SupabaseClient {
    async fn fetch_all(&self) -> Result<RemoteSnapshot> {
        let request = self.authorize(
            self.http()
                .get(self.table_url())
                .query(&[("select", "*"), ("order", "created_at.desc")]),
        );

        let response = request
            .send()
            .await
            .map_err(|error| Error::RemoteFetch(error.to_string()))?;
        let rows = read_rows(response).await.map_err(Error::RemoteFetch)?;

        let snapshot = RemoteSnapshot::from_rows(rows);
        tracing::debug!(
            "Fetched {} remote records ({} quarantined)",
            snapshot.records.len(),
            snapshot.rejected
        );
        Ok(snapshot)
    }
}

impl RemoteRecordSink for SupabaseClient {
    async fn insert(&self, record: &NewRemoteRecord) -> Result<RemoteRecord> {
        let request = self.authorize(
            self.http()
                .post(self.table_url())
                .header("Prefer", "return=representation")
                .json(record),
        );

        let response = request
            .send()
            .await
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;
        let rows = read_rows(response).await.map_err(Error::RemoteWrite)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::RemoteWrite("insert returned no row".to_string()))?;

        let stored = RemoteRecord::from_row(row)
            .map_err(|reason| Error::RemoteWrite(format!("inserted row is invalid: {reason}")))?;
        tracing::info!("Created remote record {}", stored.id);
        Ok(stored)
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Err(Error::InvalidInput("no record ids to delete".to_string()));
        }

        let values = ids
            .iter()
            .map(|id| quote_filter_value(id))
            .collect::<Vec<_>>();
        let filter = format!("in.({})", values.join(","));
        let request = self.authorize(
            self.http()
                .delete(self.table_url())
                .header("Prefer", "return=representation")
                .query(&[("id", filter.as_str())]),
        );

        let response = request
            .send()
            .await
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;
        let deleted = read_rows(response).await.map_err(Error::RemoteWrite)?.len();
        tracing::info!("Deleted {} of {} requested remote records", deleted, ids.len());
        Ok(deleted)
    }
}

/// Read a JSON array of rows, turning HTTP failures into a message.
async fn read_rows(response: Response) -> std::result::Result<Vec<serde_json::Value>, String> {
    let status = response.status();
    let body = response.text().await.map_err(|error| error.to_string())?;
    if !status.is_success() {
        return Err(parse_api_error(status, &body));
    }
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<serde_json::Value>>(&body)
        .map_err(|error| format!("unexpected response body: {error}"))
}

/// Quote a value for a PostgREST `in.(...)` list.
fn quote_filter_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
