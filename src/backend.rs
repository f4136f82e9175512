use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::{Role, SessionGrant, Subscriber};

// 1. Backend Contract

/// BackendError
///
/// The failure taxonomy for backend API calls. Callers that must fail closed
/// (the Access Gate) collapse every variant into the same decision; callers
/// that report upstream (handlers) map variants onto HTTP statuses.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Network-level failure: unreachable host, connection reset, or the
    /// client-side timeout elapsing.
    Transport(String),
    /// The backend answered with a non-success HTTP status.
    Status(u16),
    /// The backend answered 2xx but the body did not match the expected envelope.
    Malformed(String),
    /// The envelope parsed but carried a role outside the recognized set.
    UnknownRole(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "backend unreachable: {}", msg),
            BackendError::Status(code) => write!(f, "backend returned status {}", code),
            BackendError::Malformed(msg) => write!(f, "malformed backend response: {}", msg),
            BackendError::UnknownRole(role) => write!(f, "unrecognized role '{}'", role),
        }
    }
}

impl std::error::Error for BackendError {}

/// BackendApi
///
/// Defines the abstract contract for all interactions with the backend API.
/// This trait allows us to swap the concrete implementation—from the real HTTP
/// client (HttpBackendClient) in production to the in-memory Mock
/// (MockBackendApi) during testing—without affecting the gate, the dispatcher,
/// or the handlers.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Resolves the role behind a session token via GET /auth/me.
    /// The token is attached as a Bearer credential and never inspected locally.
    async fn resolve_role(&self, token: &str) -> Result<Role, BackendError>;

    /// Fetches the current active-subscriber snapshot via GET /subscribers/active.
    /// No pagination or consistency guarantee beyond "whatever the backend
    /// returned at call time".
    async fn active_subscribers(&self) -> Result<Vec<Subscriber>, BackendError>;

    /// Exchanges credentials for a session token via POST /auth/login.
    async fn login(&self, email: &str, password: &str) -> Result<SessionGrant, BackendError>;

    /// Invalidates a session token via POST /auth/logout. Best-effort from the
    /// caller's perspective; the cookie is cleared regardless.
    async fn logout(&self, token: &str) -> Result<(), BackendError>;
}

/// BackendState
///
/// The concrete type used to share backend API access across the application state.
pub type BackendState = Arc<dyn BackendApi>;

// 2. The Real Implementation (HTTP/JSON over reqwest)

// --- Response Envelopes ---
// Minimal structs to deserialize the backend's JSON envelopes. Only the fields
// this gateway consumes are declared; everything else is ignored.

#[derive(Deserialize)]
struct MeEnvelope {
    data: MeData,
}

#[derive(Deserialize)]
struct MeData {
    user: MeUser,
}

#[derive(Deserialize)]
struct MeUser {
    role: String,
}

#[derive(Deserialize)]
struct SubscribersEnvelope {
    data: Vec<Subscriber>,
}

#[derive(Deserialize)]
struct LoginEnvelope {
    data: LoginData,
}

#[derive(Deserialize)]
struct LoginData {
    token: String,
    user: MeUser,
}

/// HttpBackendClient
///
/// The concrete implementation of `BackendApi`, backed by the portal's backend
/// API over HTTP/JSON. Every request inherits the client-wide timeout so that
/// a slow backend degrades into a `Transport` error instead of a hung request;
/// the gate depends on this bound to keep page navigation from stalling.
#[derive(Clone)]
pub struct HttpBackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendClient {
    /// new
    ///
    /// Constructs the client with a bounded request timeout. The base URL is
    /// stored without a trailing slash so endpoint paths can be appended verbatim.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string())?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendApi for HttpBackendClient {
    async fn resolve_role(&self, token: &str) -> Result<Role, BackendError> {
        let response = self
            .client
            .get(self.endpoint("/auth/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        let envelope = response
            .json::<MeEnvelope>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let raw_role = envelope.data.user.role;
        Role::parse(&raw_role).ok_or(BackendError::UnknownRole(raw_role))
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>, BackendError> {
        let response = self
            .client
            .get(self.endpoint("/subscribers/active"))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        let envelope = response
            .json::<SubscribersEnvelope>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        Ok(envelope.data)
    }

    async fn login(&self, email: &str, password: &str) -> Result<SessionGrant, BackendError> {
        let response = self
            .client
            .post(self.endpoint("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        let envelope = response
            .json::<LoginEnvelope>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let raw_role = envelope.data.user.role;
        let role = Role::parse(&raw_role).ok_or(BackendError::UnknownRole(raw_role))?;

        Ok(SessionGrant {
            token: envelope.data.token,
            role,
        })
    }

    async fn logout(&self, token: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}

// 3. The Mock Implementation (For Unit Tests)

/// MockBackendApi
///
/// A mock implementation of `BackendApi` used exclusively for unit and
/// integration testing. Each operation's outcome is a pre-canned result, so a
/// test can simulate any backend failure mode (timeout, 500, malformed body,
/// unknown role) without a network. Call counters let tests assert that an
/// operation was never reached at all.
pub struct MockBackendApi {
    pub role_response: Result<Role, BackendError>,
    pub subscriber_response: Result<Vec<Subscriber>, BackendError>,
    pub login_response: Result<SessionGrant, BackendError>,
    /// Number of resolve_role calls observed, for "no lookup happened" assertions.
    pub role_calls: AtomicUsize,
}

impl MockBackendApi {
    pub fn new() -> Self {
        Self {
            role_response: Ok(Role::Member),
            subscriber_response: Ok(Vec::new()),
            login_response: Ok(SessionGrant {
                token: "test-token".to_string(),
                role: Role::Member,
            }),
            role_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_role(role: Role) -> Self {
        Self {
            role_response: Ok(role),
            ..Self::new()
        }
    }

    pub fn with_role_failure(error: BackendError) -> Self {
        Self {
            role_response: Err(error),
            ..Self::new()
        }
    }

    pub fn with_subscribers(subscribers: Vec<Subscriber>) -> Self {
        Self {
            subscriber_response: Ok(subscribers),
            ..Self::new()
        }
    }

    pub fn role_call_count(&self) -> usize {
        self.role_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockBackendApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendApi for MockBackendApi {
    async fn resolve_role(&self, _token: &str) -> Result<Role, BackendError> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        self.role_response.clone()
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>, BackendError> {
        self.subscriber_response.clone()
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<SessionGrant, BackendError> {
        match &self.login_response {
            Ok(grant) => Ok(grant.clone()),
            Err(e) => Err(e.clone()),
        }
    }

    async fn logout(&self, _token: &str) -> Result<(), BackendError> {
        Ok(())
    }
}
