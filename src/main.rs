use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use village_portal::{
    AppState,
    backend::{BackendState, HttpBackendClient},
    config::{AppConfig, Env},
    create_router,
    mailer::{MailerState, SmtpMailer},
};

/// main
///
/// The asynchronous entry point for the application, responsible for initializing
/// all core components: Configuration, Logging, the Backend API client, the Mail
/// Transport, and the HTTP Server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production secrets.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Sets the default log level. It prioritizes the RUST_LOG environment variable,
    // falling back to sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "village_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment (Production Observability)
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

    // 4. Backend API Client Initialization
    // The client-wide timeout bounds the gate's role-lookup call so page
    // navigation can never stall on a slow backend.
    let backend_client =
        HttpBackendClient::new(&config.backend_base_url, config.role_lookup_timeout())
            .expect("FATAL: Failed to construct backend API client.");
    let backend = Arc::new(backend_client) as BackendState;

    // 5. Mail Transport Initialization (SMTP)
    // Constructed once here and threaded into the dispatcher through AppState;
    // the transport is never a module-level global.
    let smtp_mailer = SmtpMailer::new(
        &config.smtp_host,
        config.smtp_port,
        config.smtp_secure,
        &config.smtp_user,
        &config.smtp_pass,
        &config.mail_from,
    )
    .expect("FATAL: Failed to construct SMTP transport. Check SMTP_* and MAIL_FROM.");
    let mailer = Arc::new(smtp_mailer) as MailerState;

    // 6. Unified State Assembly
    // Bundles all initialized dependencies into the shared AppState.
    let app_state = AppState {
        backend,
        mailer,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    // Binds the TCP listener and initiates the HTTP server.
    let listener = TcpListener::bind("0.0.0.0:3000").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/api/docs");

    // The long-running Axum server process.
    axum::serve(listener, app).await.unwrap();
}
