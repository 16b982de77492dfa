use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// The JSON surface for user and event records. Both resources expose the same five
/// operations; the session gate does not apply here, matching the admin pages being
/// the only protected surface.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // POST /api/user creates, GET /api/user lists.
        .route(
            "/api/user",
            post(handlers::create_user).get(handlers::list_users),
        )
        // Single-user operations, addressed by provider uid.
        .route(
            "/api/user/{uid}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // POST /api/event creates, GET /api/event lists.
        .route(
            "/api/event",
            post(handlers::create_event).get(handlers::list_events),
        )
        // Single-event operations, addressed by generated id.
        .route(
            "/api/event/{id}",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
}
