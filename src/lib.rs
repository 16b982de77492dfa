use axum::{Router, extract::FromRef, http::HeaderName, middleware, routing::get};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod views;

// Module for routing segregation (API, Admin pages).
pub mod routes;
use routes::{admin, api};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs)
// and to the integration tests.
pub use auth::{AccessGate, CredentialVerifier};
pub use config::AppConfig;
pub use repository::{PostgresEventStore, PostgresUserStore};
pub use service::{EventService, UserService};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas that have been decorated with
/// the `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all API handler functions here for documentation generation.
    paths(
        handlers::create_user, handlers::list_users, handlers::get_user,
        handlers::update_user, handlers::delete_user,
        handlers::create_event, handlers::list_events, handlers::get_event,
        handlers::update_event, handlers::delete_event
    ),
    // List all models (schemas) used in the request/response bodies.
    components(schemas(models::User, models::Event, models::EventPayload)),
    tags(
        (name = "event-portal", description = "Event Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe container holding all application services and
/// configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// User records, behind the service and store layers.
    pub users: UserService,
    /// Event records, behind the service and store layers.
    pub events: EventService,
    /// The session gate guarding the admin surface.
    pub gate: Arc<AccessGate>,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers and middleware to selectively pull components
// from the shared AppState.

impl FromRef<AppState> for UserService {
    fn from_ref(app_state: &AppState) -> UserService {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for EventService {
    fn from_ref(app_state: &AppState) -> EventService {
        app_state.events.clone()
    }
}

impl FromRef<AppState> for Arc<AccessGate> {
    fn from_ref(app_state: &AppState) -> Arc<AccessGate> {
        app_state.gate.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped
/// middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // Documentation routes sit behind the same session gate as the admin pages.
    let swagger: Router<AppState> =
        Router::from(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_session,
            ));

    // 2. Base Router Assembly
    let base_router = Router::new()
        // GET / and GET /sign-in: the open HTML pages.
        .route("/", get(handlers::home))
        .route("/sign-in", get(handlers::sign_in))
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // API Routes: no session required.
        .merge(api::api_routes())
        // Admin Pages: nested under '/admin', protected route-by-route so an
        // unmatched path still falls through to the global 404 instead of a 403.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_session,
            )),
        )
        // Documentation: the gated Swagger UI.
        .merge(swagger)
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a tracing
                // span that carries the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: returns the x-request-id header to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (Applied last, allowing all traffic in/out after processing)
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
