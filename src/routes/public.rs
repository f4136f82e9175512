use crate::{AppState, handlers};
use axum::{Router, routing::get, routing::post};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in): the health probe and the session-establishing
/// credential exchange. Everything that hands out data requires a session and
/// lives in the authenticated/admin modules.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/api/health", get(|| async { "ok" }))
        // POST /api/auth/login
        // Relays credentials to the backend API and sets the HTTP-only session
        // cookie on success. The cookie is the only place the token ever lives
        // client-side.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/logout
        // Clears the session cookie and notifies the backend on a best-effort
        // basis. Deliberately public: a client with a stale or broken token
        // must still be able to end its session.
        .route("/api/auth/logout", post(handlers::logout))
}
