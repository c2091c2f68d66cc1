//! Supabase client handle shared by the record source, probe, sink and auth.

use reqwest::{Client, RequestBuilder};

use crate::config::RemoteSettings;
use crate::error::{Error, Result};

/// Explicit handle to one Supabase project.
///
/// Built once at startup and passed to every component that talks to the
/// remote store. Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    table: String,
    access_token: Option<String>,
    http: Client,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .field("authenticated", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        if settings.anon_key.trim().is_empty() {
            return Err(Error::Config("Supabase anon key must not be empty".to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.trim().to_string(),
            table: settings.table.clone(),
            access_token: None,
            http: builder.build()?,
        })
    }

    /// Copy of this handle that acts on behalf of a signed-in user.
    #[must_use]
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub const fn http(&self) -> &Client {
        &self.http
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// PostgREST endpoint for the records table.
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// GoTrue endpoint root.
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.base_url)
    }

    /// Attach the project key and the user (or anon) bearer token.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request.header("apikey", &self.anon_key).bearer_auth(bearer)
    }
}
