use event_portal::{
    AppState,
    auth::AccessGate,
    config::{AppConfig, Env},
    create_router, repository,
    repository::{PostgresEventStore, PostgresUserStore},
    service::{EventService, UserService},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the application, responsible for initializing
/// all core components: Configuration, Logging, Database, Session Gate, and the
/// HTTP Server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing secrets.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Sets the default log level. It prioritizes the RUST_LOG environment variable,
    // falling back to sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "event_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    // The structured logging format is dynamically selected based on the APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability during local debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON format output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres)
    // Creates a connection pool to the Postgres instance defined in the configuration.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Create the application tables on first run.
    repository::init_schema(&pool)
        .await
        .expect("FATAL: Failed to initialize the database schema.");

    // Instantiate the services over their Postgres-backed stores.
    let users = UserService::new(Arc::new(PostgresUserStore::new(pool.clone())));
    let events = EventService::new(Arc::new(PostgresEventStore::new(pool)));

    // 5. Session Gate Initialization
    // Local verification against the configured RSA public key, with the identity
    // provider's API as the fallback path.
    let gate = Arc::new(
        AccessGate::from_config(&config)
            .expect("FATAL: Failed to parse the configured RSA public key."),
    );

    // 6. Unified State Assembly
    // Bundles all initialized dependencies into the shared AppState.
    let app_state = AppState {
        users,
        events,
        gate,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    // Binds the TCP listener and initiates the HTTP server.
    let listener = TcpListener::bind("0.0.0.0:8080").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:8080");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:8080/swagger-ui");

    // The long-running Axum server process.
    axum::serve(listener, app).await.unwrap();
}
