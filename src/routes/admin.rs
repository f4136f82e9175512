use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the 'admin' role.
///
/// Access Control:
/// This router is mounted behind the authentication layer, and the 'admin'
/// role check is performed *inside* the handlers after the request passes
/// that layer. An authenticated member hitting these endpoints receives 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/admin/notifications
        // Triggers a bulk notification dispatch to every active subscriber.
        // Body: { "type": "announcement" | "news", "data": { title, body, link? } }.
        // Per-recipient outcomes come back in the response; individual send
        // failures never abort the batch.
        .route("/notifications", post(handlers::dispatch_notifications))
}
