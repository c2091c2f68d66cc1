//! Supabase auth (GoTrue) sessions for the signed-in operator.

use std::fmt;

use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use crate::remote::SupabaseClient;
use crate::util::{parse_api_error, unix_timestamp_now};

/// Key holding the JSON-encoded session.
pub const SESSION_KEY: &str = "@auth_session";

const EXPIRY_SKEW_SECONDS: i64 = 60;
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    /// The project requires the email to be confirmed before signing in.
    ConfirmationRequired,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Password sign-in and session upkeep, persisted in a `KeyValueStore`.
#[derive(Clone)]
pub struct SupabaseAuthClient<S> {
    client: SupabaseClient,
    store: S,
}

impl<S: KeyValueStore> SupabaseAuthClient<S> {
    pub const fn new(client: SupabaseClient, store: S) -> Self {
        Self { client, store }
    }

    /// Stored session without contacting the server.
    pub async fn stored_session(&self) -> Result<Option<AuthSession>> {
        load_stored_session(&self.store).await
    }

    /// Stored session, refreshed first if it is about to expire.
    ///
    /// Only a refresh token rejected by the server clears the session. When the
    /// server cannot be reached the stale session is returned unchanged.
    pub async fn restore_session(&self) -> Result<Option<AuthSession>> {
        let Some(stored_session) = self.stored_session().await? else {
            return Ok(None);
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(Error::AuthRejected(message)) => {
                tracing::warn!("Stored session was rejected, signing out: {}", message);
                self.store.remove(SESSION_KEY).await?;
                Ok(None)
            }
            Err(error) => {
                tracing::warn!("Could not refresh stored session, keeping it: {}", error);
                Ok(Some(stored_session))
            }
        }
    }

    /// Create an account; the session is stored when the project auto-confirms.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        validate_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(Error::Auth(format!(
                "Password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let request = self.public_request(
            self.client
                .http()
                .post(format!("{}/signup", self.client.auth_url()))
                .json(&payload),
        );

        match send_auth_request(request).await?.into_optional_session()? {
            Some(session) => {
                self.save_session(&session).await?;
                tracing::info!("Signed up and signed in as {}", session.user.id);
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => {
                tracing::info!("Sign-up pending email confirmation");
                Ok(SignUpOutcome::ConfirmationRequired)
            }
        }
    }

    /// Ask the server to email a password reset link.
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::Auth("Email is required".to_string()));
        }

        let mut request = self
            .client
            .http()
            .post(format!("{}/recover", self.client.auth_url()))
            .json(&serde_json::json!({ "email": email }));
        if let Some(redirect_to) = redirect_to.map(str::trim).filter(|value| !value.is_empty()) {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        let response = self.public_request(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status, &body));
        }
        tracing::info!("Requested password reset email");
        Ok(())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let request = self.public_request(
            self.client
                .http()
                .post(format!("{}/token", self.client.auth_url()))
                .query(&[("grant_type", "password")])
                .json(&payload),
        );

        let session = send_auth_request(request).await?.into_session()?;
        self.save_session(&session).await?;
        tracing::info!("Signed in as {}", session.user.id);
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(Error::Auth("Refresh token must not be empty".to_string()));
        }

        let payload = serde_json::json!({
            "refresh_token": refresh_token,
        });
        let request = self.public_request(
            self.client
                .http()
                .post(format!("{}/token", self.client.auth_url()))
                .query(&[("grant_type", "refresh_token")])
                .json(&payload),
        );

        let session = send_auth_request(request).await?.into_session()?;
        self.save_session(&session).await?;
        tracing::debug!("Refreshed session for {}", session.user.id);
        Ok(session)
    }

    /// Revoke the token server-side and forget the stored session.
    ///
    /// An already invalid token (HTTP 401) still clears the local session.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let request = self
            .client
            .http()
            .post(format!("{}/logout", self.client.auth_url()))
            .header("apikey", self.client.anon_key())
            .bearer_auth(access_token);

        let response = request.send().await?;
        let status = response.status();
        if !(status.is_success() || status == StatusCode::UNAUTHORIZED) {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status, &body));
        }

        self.store.remove(SESSION_KEY).await
    }

    async fn save_session(&self, session: &AuthSession) -> Result<()> {
        let serialized = serde_json::to_string(session)?;
        self.store.set(SESSION_KEY, &serialized).await
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.client.anon_key())
            .bearer_auth(self.client.anon_key())
    }
}

/// Read the persisted session; an unreadable entry is removed.
pub async fn load_stored_session<S: KeyValueStore>(store: &S) -> Result<Option<AuthSession>> {
    let Some(raw) = store.get(SESSION_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<AuthSession>(&raw) {
        Ok(session) => Ok(Some(session)),
        Err(error) => {
            tracing::warn!("Discarding unreadable stored session: {}", error);
            store.remove(SESSION_KEY).await?;
            Ok(None)
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::Auth("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(Error::Auth("Password is required".to_string()));
    }
    Ok(())
}

async fn send_auth_request(request: RequestBuilder) -> Result<TokenResponse> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(auth_error(status, &body));
    }
    Ok(response.json::<TokenResponse>().await?)
}

/// 4xx answers mean the server refused the credentials or token.
fn auth_error(status: StatusCode, body: &str) -> Error {
    let message = parse_api_error(status, body);
    if status.is_client_error() {
        Error::AuthRejected(message)
    } else {
        Error::Auth(message)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<TokenUser>,
}

impl TokenResponse {
    /// `None` when the response carries no access token, as for an
    /// unconfirmed sign-up.
    fn into_optional_session(self) -> Result<Option<AuthSession>> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        self.into_session().map(Some)
    }

    fn into_session(self) -> Result<AuthSession> {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
        });

        match (self.access_token, self.refresh_token, expires_at, self.user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user: AuthUser {
                        id: user.id,
                        email: user.email,
                    },
                })
            }
            _ => Err(Error::Auth(
                "Auth response did not include an active session".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteSettings;
    use crate::db::MemoryKeyValueStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_for(server: &MockServer) -> SupabaseAuthClient<MemoryKeyValueStore> {
        auth_at(server.uri())
    }

    fn auth_at(url: String) -> SupabaseAuthClient<MemoryKeyValueStore> {
        let client = SupabaseClient::new(&RemoteSettings {
            url,
            anon_key: "anon-key".to_string(),
            table: "procesos".to_string(),
            timeout: None,
        })
        .unwrap();
        SupabaseAuthClient::new(client, MemoryKeyValueStore::new())
    }

    fn session_expiring_at(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "old-access".to_string(),
            refresh_token: "old-refresh".to_string(),
            expires_at,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("operario@planta.mx".to_string()),
            },
        }
    }

    fn token_body(access_token: &str) -> serde_json::Value {
        json!({
            "access_token": access_token,
            "refresh_token": "new-refresh",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {"id": "user-1", "email": "operario@planta.mx"}
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_in_persists_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon-key"))
            .and(body_partial_json(json!({"email": "operario@planta.mx"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1")))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        let session = auth.sign_in(" operario@planta.mx ", "secreto").await.unwrap();

        assert_eq!(session.access_token, "access-1");
        assert!(!session.is_expired());
        assert_eq!(auth.stored_session().await.unwrap(), Some(session));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_in_reports_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        let error = auth.sign_in("a@b.c", "wrong").await.unwrap_err();

        assert!(error.to_string().contains("Invalid login credentials (400)"));
        assert_eq!(auth.stored_session().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_in_requires_credentials() {
        let server = MockServer::start().await;
        let auth = auth_for(&server);

        assert!(matches!(auth.sign_in(" ", "pw").await, Err(Error::Auth(_))));
        assert!(matches!(auth.sign_in("a@b.c", "").await, Err(Error::Auth(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_keeps_fresh_session_without_network() {
        let server = MockServer::start().await;
        let auth = auth_for(&server);
        let session = session_expiring_at(unix_timestamp_now() + 3_600);
        auth.save_session(&session).await.unwrap();

        assert_eq!(auth.restore_session().await.unwrap(), Some(session));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_refreshes_session_inside_skew() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_partial_json(json!({"refresh_token": "old-refresh"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2")))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        auth.save_session(&session_expiring_at(unix_timestamp_now() + 30))
            .await
            .unwrap();

        let restored = auth.restore_session().await.unwrap().unwrap();
        assert_eq!(restored.access_token, "access-2");
        assert_eq!(auth.stored_session().await.unwrap(), Some(restored));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_clears_session_when_refresh_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"msg": "Invalid Refresh Token"})),
            )
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        auth.save_session(&session_expiring_at(0)).await.unwrap();

        assert_eq!(auth.restore_session().await.unwrap(), None);
        assert_eq!(auth.stored_session().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_keeps_expired_session_when_server_unreachable() {
        let auth = auth_at("http://127.0.0.1:9".to_string());
        let expired = session_expiring_at(0);
        auth.save_session(&expired).await.unwrap();

        assert_eq!(auth.restore_session().await.unwrap(), Some(expired.clone()));
        assert_eq!(auth.stored_session().await.unwrap(), Some(expired));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_keeps_expired_session_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        let expired = session_expiring_at(0);
        auth.save_session(&expired).await.unwrap();

        assert_eq!(auth.restore_session().await.unwrap(), Some(expired.clone()));
        assert_eq!(auth.stored_session().await.unwrap(), Some(expired));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_up_with_autoconfirm_stores_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(header("apikey", "anon-key"))
            .and(body_partial_json(
                json!({"email": "nuevo@planta.mx", "password": "secreto"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-3")))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        let outcome = auth.sign_up("nuevo@planta.mx", "secreto").await.unwrap();

        let session = match outcome {
            SignUpOutcome::SignedIn(session) => session,
            other => panic!("expected a session, got {other:?}"),
        };
        assert_eq!(session.access_token, "access-3");
        assert_eq!(auth.stored_session().await.unwrap(), Some(session));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_up_pending_confirmation_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-2",
                "email": "nuevo@planta.mx",
                "confirmation_sent_at": "2024-05-01T10:00:00Z"
            })))
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        let outcome = auth.sign_up("nuevo@planta.mx", "secreto").await.unwrap();

        assert_eq!(outcome, SignUpOutcome::ConfirmationRequired);
        assert_eq!(auth.stored_session().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_up_rejects_short_password_locally() {
        let server = MockServer::start().await;
        let auth = auth_for(&server);

        assert!(matches!(
            auth.sign_up("nuevo@planta.mx", "12345").await,
            Err(Error::Auth(_))
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_up_reports_registered_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"msg": "User already registered"})),
            )
            .mount(&server)
            .await;

        let error = auth_for(&server)
            .sign_up("nuevo@planta.mx", "secreto")
            .await
            .unwrap_err();
        assert!(matches!(error, Error::AuthRejected(_)));
        assert!(error.to_string().contains("already registered"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reset_password_posts_recover_with_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .and(query_param("redirect_to", "procdocs://reset-password"))
            .and(header("apikey", "anon-key"))
            .and(body_partial_json(json!({"email": "operario@planta.mx"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        auth_for(&server)
            .reset_password_for_email(" operario@planta.mx ", Some("procdocs://reset-password"))
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reset_password_requires_email_and_reports_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({"msg": "Email rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        assert!(matches!(
            auth.reset_password_for_email("  ", None).await,
            Err(Error::Auth(_))
        ));
        let error = auth
            .reset_password_for_email("operario@planta.mx", None)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Email rate limit exceeded (429)"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_out_clears_even_when_token_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer old-access"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        auth.save_session(&session_expiring_at(unix_timestamp_now() + 3_600))
            .await
            .unwrap();

        auth.sign_out("old-access").await.unwrap();
        assert_eq!(auth.stored_session().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreadable_stored_session_is_discarded() {
        let server = MockServer::start().await;
        let auth = auth_for(&server);
        auth.store.set(SESSION_KEY, "not json").await.unwrap();

        assert_eq!(auth.stored_session().await.unwrap(), None);
        assert_eq!(auth.store.get(SESSION_KEY).await.unwrap(), None);
    }

    #[test]
    fn response_without_tokens_is_rejected() {
        let response = TokenResponse {
            access_token: None,
            refresh_token: None,
            expires_at: None,
            expires_in: None,
            user: Some(TokenUser {
                id: "user".to_string(),
                email: None,
            }),
        };
        assert!(matches!(response.into_session(), Err(Error::Auth(_))));
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session_expiring_at(1_700_000_000));
        assert!(!rendered.contains("old-access"));
        assert!(!rendered.contains("old-refresh"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
