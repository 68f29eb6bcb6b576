//! Identity service
//!
//! Issues user tokens and validates them for downstream services.

use common::secret::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user_api::config::Config;
use user_api::observability::metrics::init_metrics_recorder;
use user_api::repositories::{InMemoryUserRepository, PgUserRepository, UserRepository};
use user_api::routes::{self, AppState};
use user_api::services::user_service;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting identity service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        issuer = %config.jwt.issuer,
        audience = %config.jwt.audience,
        lifetime_seconds = config.jwt.lifetime_seconds,
        validate_lifetime = config.jwt.validate_lifetime,
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let users: Arc<dyn UserRepository> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(std::time::Duration::from_secs(5))
                .connect(database_url)
                .await
                .map_err(|e| {
                    error!("Failed to connect to database: {}", e);
                    e
                })?;

            sqlx::migrate!("./migrations")
                .run(&db_pool)
                .await
                .map_err(|e| {
                    error!("Failed to run migrations: {}", e);
                    e
                })?;

            info!("Database connection established");
            Arc::new(PgUserRepository::new(db_pool))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory user store");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    if let Some(seed) = &config.seed_admin {
        user_service::ensure_admin(
            users.as_ref(),
            config.bcrypt_cost,
            &seed.email,
            seed.password.expose_secret(),
        )
        .await
        .map_err(|e| {
            error!("Failed to seed admin user: {}", e);
            e
        })?;
    }

    // Parse bind address before moving config
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let state = Arc::new(AppState::new(config, users));
    let app = routes::build_routes(state, metrics_handle);

    info!("Identity service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Identity service shutdown complete");

    Ok(())
}

/// `LOG_FORMAT=json` switches to JSON lines; the default is human-readable.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "user_api=debug,common=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
