use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// The server-rendered management pages, nested under /admin.
///
/// Access Control:
/// This entire router is wrapped in the `require_session` middleware when it is
/// nested into the application, so a request reaching any handler here already
/// carries a `VerifiedSession` extension. No handler below repeats the check.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // The dashboard, with record counts and the verified subject.
        .route("/", get(handlers::admin_home))
        // GET /admin/user
        // Table of user records with inline create and delete controls.
        .route("/user", get(handlers::admin_users_page))
        // GET /admin/event
        // Table of event records with inline create and delete controls.
        .route("/event", get(handlers::admin_events_page))
}
