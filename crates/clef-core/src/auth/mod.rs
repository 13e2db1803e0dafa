//! Credential exchange and boot-time session resolution.
//!
//! A [`Session`] only ever exists after the backend has vouched for its
//! token, so "identity present iff token valid" holds by construction.

use std::fmt;

use reqwest::Client;
use serde::Deserialize;

use crate::api::{decode_json, success_body};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// An authenticated session: the bearer token plus the identity it resolved to.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Durable storage for the single auth token.
pub trait TokenStore: Clone + Send + Sync + 'static {
    /// `Ok(None)` when no token has ever been stored or it was cleared.
    fn load_token(&self) -> Result<Option<String>>;
    fn save_token(&self, token: &str) -> Result<()>;
    /// Idempotent; clearing an absent token succeeds.
    fn clear_token(&self) -> Result<()>;
}

/// What a registration attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The backend issued a token right away.
    SignedIn(Session),
    /// Account created; the user signs in manually.
    Created,
}

/// HTTP client for the backend's credential and identity endpoints.
#[derive(Clone)]
pub struct AuthClient {
    config: ClientConfig,
    client: Client,
}

impl AuthClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    /// Exchange credentials for a token. Touches no store.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let response = self
            .client
            .post(self.config.endpoint("/login"))
            .json(&payload)
            .send()
            .await?;
        let body = success_body(response).await?;
        let payload: TokenResponse = decode_json(&body, "login")?;

        payload
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                Error::MalformedResponse("login response did not include a token".to_string())
            })
    }

    /// Create an account. Some deployments answer with a token straight
    /// away; those behave like a login.
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisterOutcome> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let response = self
            .client
            .post(self.config.endpoint("/register"))
            .json(&payload)
            .send()
            .await?;
        let body = success_body(response).await?;
        let payload: TokenResponse = decode_json(&body, "register")?;

        match payload.token.filter(|token| !token.trim().is_empty()) {
            Some(token) => {
                let identity = self.identity(&token).await?;
                Ok(RegisterOutcome::SignedIn(Session { token, identity }))
            }
            None => Ok(RegisterOutcome::Created),
        }
    }

    /// Ask the backend who a token belongs to. Any refusal means the token
    /// is invalid.
    pub async fn identity(&self, token: &str) -> Result<String> {
        let response = self
            .client
            .get(self.config.endpoint("/user"))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;
        let body = success_body(response).await?;
        let payload: IdentityResponse = decode_json(&body, "identity")?;

        payload
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| {
                Error::MalformedResponse("identity response did not include an email".to_string())
            })
    }

    /// Login plus identity check, producing a full session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let token = self.login(email, password).await?;
        let identity = self.identity(&token).await?;
        Ok(Session { token, identity })
    }
}

/// Resolution status of the stored token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The stored token has not been checked yet.
    #[default]
    Resolving,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Boot-time resolver: settles the stored token into a definite state,
/// exactly once.
pub struct SessionResolver<S: TokenStore> {
    store: S,
    client: AuthClient,
    state: SessionState,
}

impl<S: TokenStore> SessionResolver<S> {
    pub fn new(client: AuthClient, store: S) -> Self {
        Self {
            store,
            client,
            state: SessionState::Resolving,
        }
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Check the stored token against the backend. The first call settles
    /// the state; later calls return it unchanged.
    pub async fn resolve(&mut self) -> &SessionState {
        if self.state == SessionState::Resolving {
            self.state = self.resolve_stored_token().await;
        }
        &self.state
    }

    async fn resolve_stored_token(&self) -> SessionState {
        let stored = match self.store.load_token() {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!("Could not read the stored token: {error}");
                return SessionState::Unauthenticated;
            }
        };
        let Some(token) = stored else {
            return SessionState::Unauthenticated;
        };

        match self.client.identity(&token).await {
            Ok(identity) => SessionState::Authenticated(Session { token, identity }),
            Err(Error::Network(error)) => {
                // The token may still be good; keep it for the next boot.
                tracing::warn!("Could not validate the stored token: {error}");
                SessionState::Unauthenticated
            }
            Err(error) => {
                tracing::warn!("Stored token was rejected: {error}");
                if let Err(clear_error) = self.store.clear_token() {
                    tracing::warn!("Could not clear the rejected token: {clear_error}");
                }
                SessionState::Unauthenticated
            }
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::InvalidInput("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(Error::InvalidInput("Password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{spawn_backend, MemoryTokenStore};

    #[derive(Default)]
    struct BackendState {
        hits: AtomicUsize,
    }

    fn stub_client(addr: std::net::SocketAddr) -> AuthClient {
        let config = ClientConfig::new(&format!("http://{addr}")).unwrap();
        AuthClient::new(config).unwrap()
    }

    async fn login_handler(
        State(state): State<Arc<BackendState>>,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        state.hits.fetch_add(1, Ordering::SeqCst);
        if body["email"] == "user@example.com" && body["password"] == "hunter2" {
            (StatusCode::OK, Json(serde_json::json!({ "token": "tok-1" })))
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Invalid credentials" })),
            )
        }
    }

    async fn user_handler(
        State(state): State<Arc<BackendState>>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<serde_json::Value>) {
        state.hits.fetch_add(1, Ordering::SeqCst);
        let authorization = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if authorization == "Bearer tok-1" {
            (
                StatusCode::OK,
                Json(serde_json::json!({ "email": "user@example.com" })),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Bad token" })),
            )
        }
    }

    async fn spawn_auth_backend() -> (std::net::SocketAddr, Arc<BackendState>) {
        let state = Arc::new(BackendState::default());
        let router = Router::new()
            .route("/login", post(login_handler))
            .route("/user", get(user_handler))
            .with_state(Arc::clone(&state));
        (spawn_backend(router).await, state)
    }

    #[test]
    fn session_debug_redacts_token() {
        let session = Session {
            token: "secret-token".to_string(),
            identity: "user@example.com".to_string(),
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("user@example.com"));
    }

    #[test]
    fn credentials_are_validated_locally() {
        assert!(matches!(
            validate_credentials("", "pw"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            validate_credentials("a@b.c", "  "),
            Err(Error::InvalidInput(_))
        ));
        assert!(validate_credentials("a@b.c", "pw").is_ok());
    }

    #[tokio::test]
    async fn sign_in_resolves_token_and_identity() {
        let (addr, _) = spawn_auth_backend().await;
        let client = stub_client(addr);

        let session = client.sign_in("user@example.com", "hunter2").await.unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.identity, "user@example.com");
    }

    #[tokio::test]
    async fn login_surfaces_backend_message() {
        let (addr, _) = spawn_auth_backend().await;
        let client = stub_client(addr);

        let error = client.login("user@example.com", "wrong").await.unwrap_err();
        match error {
            Error::BackendRejected { status, reason } => {
                assert_eq!(status, 401);
                assert_eq!(reason, "Invalid credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolver_without_token_skips_the_network() {
        let (addr, state) = spawn_auth_backend().await;
        let mut resolver = SessionResolver::new(stub_client(addr), MemoryTokenStore::new());

        assert_eq!(resolver.state(), &SessionState::Resolving);
        assert_eq!(resolver.resolve().await, &SessionState::Unauthenticated);
        assert_eq!(state.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolver_accepts_a_valid_token() {
        let (addr, _) = spawn_auth_backend().await;
        let store = MemoryTokenStore::with_token("tok-1");
        let mut resolver = SessionResolver::new(stub_client(addr), store.clone());

        match resolver.resolve().await {
            SessionState::Authenticated(session) => {
                assert_eq!(session.identity, "user@example.com");
            }
            other => panic!("expected authenticated state, got {other:?}"),
        }
        assert_eq!(store.current(), Some("tok-1".to_string()));
    }

    #[tokio::test]
    async fn resolver_clears_a_rejected_token() {
        let (addr, _) = spawn_auth_backend().await;
        let store = MemoryTokenStore::with_token("stale");
        let mut resolver = SessionResolver::new(stub_client(addr), store.clone());

        assert_eq!(resolver.resolve().await, &SessionState::Unauthenticated);
        assert_eq!(store.current(), None);
    }

    #[tokio::test]
    async fn resolver_keeps_the_token_when_the_server_is_unreachable() {
        // Grab a port and release it so the connection is refused.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = MemoryTokenStore::with_token("tok-1");
        let mut resolver = SessionResolver::new(stub_client(addr), store.clone());

        assert_eq!(resolver.resolve().await, &SessionState::Unauthenticated);
        assert_eq!(store.current(), Some("tok-1".to_string()));
    }

    #[tokio::test]
    async fn resolver_survives_an_unavailable_store() {
        let (addr, state) = spawn_auth_backend().await;
        let mut resolver = SessionResolver::new(stub_client(addr), MemoryTokenStore::failing());

        assert_eq!(resolver.resolve().await, &SessionState::Unauthenticated);
        assert_eq!(state.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolution_settles_after_the_first_call() {
        let (addr, state) = spawn_auth_backend().await;
        let store = MemoryTokenStore::with_token("tok-1");
        let mut resolver = SessionResolver::new(stub_client(addr), store);

        resolver.resolve().await;
        let hits = state.hits.load(Ordering::SeqCst);
        resolver.resolve().await;
        assert_eq!(state.hits.load(Ordering::SeqCst), hits);
    }

    #[tokio::test]
    async fn register_handles_both_backend_styles() {
        async fn register_with_token() -> (StatusCode, Json<serde_json::Value>) {
            (StatusCode::OK, Json(serde_json::json!({ "token": "tok-1" })))
        }
        async fn register_without_token() -> (StatusCode, Json<serde_json::Value>) {
            (StatusCode::CREATED, Json(serde_json::json!({})))
        }

        let state = Arc::new(BackendState::default());
        let router = Router::new()
            .route("/register", post(register_with_token))
            .route("/user", get(user_handler))
            .with_state(Arc::clone(&state));
        let addr = spawn_backend(router).await;
        let outcome = stub_client(addr)
            .register("new@example.com", "pw")
            .await
            .unwrap();
        match outcome {
            RegisterOutcome::SignedIn(session) => {
                assert_eq!(session.identity, "user@example.com");
            }
            RegisterOutcome::Created => panic!("expected immediate sign-in"),
        }

        let router = Router::new().route("/register", post(register_without_token));
        let addr = spawn_backend(router).await;
        let outcome = stub_client(addr)
            .register("new@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::Created);
    }
}
