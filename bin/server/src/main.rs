use quiet_sentinel_escalation::{EscalationEngine, NatsConfig, NatsDispatcher};
use quiet_sentinel_prep::{HttpMemoryRetriever, PrepService};
use quiet_sentinel_runtime::SweepDriver;
use quiet_sentinel_schedule::{AccountStore, ScheduleStore};
use quiet_sentinel_server::{
    config::ServerConfig,
    db::{
        AccountRepository, DismissalRepository, EscalationStateRepository, PrepArtifactRepository,
        ScheduleRepository,
    },
    routes,
    state::AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    config.validate().expect("invalid configuration");
    tracing::info!("Loaded configuration");

    // Create database connection pool. The acquire timeout bounds every
    // store call; operations fail instead of hanging on an unavailable
    // database.
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    // Connect notification dispatch
    tracing::info!("Connecting to NATS...");
    let nats_config = NatsConfig {
        url: config.nats.url.clone(),
        stream_name: config.nats.stream_name.clone(),
    };
    let dispatcher = NatsDispatcher::new(nats_config)
        .await
        .expect("failed to connect to NATS");

    // Wire the notification core
    let engine = Arc::new(EscalationEngine::new(
        EscalationStateRepository::new(db_pool.clone()),
        config.escalation.clone(),
        config.importance,
    ));

    let mut prep_service = PrepService::new(
        PrepArtifactRepository::new(db_pool.clone()),
        config.checklists.clone(),
        config.prep_window,
    );
    if let Some(base_url) = &config.memory.base_url {
        let retriever = HttpMemoryRetriever::new(
            base_url,
            std::time::Duration::from_secs(config.memory.timeout_seconds),
        )
        .expect("failed to build memory service client");
        prep_service = prep_service.with_retriever(retriever);
        tracing::info!(base_url = %base_url, "memory enrichment enabled");
    } else {
        tracing::info!("memory enrichment disabled (no base URL configured)");
    }
    let prep = Arc::new(prep_service);

    let schedules = Arc::new(ScheduleRepository::new(db_pool.clone()));
    let accounts = Arc::new(AccountRepository::new(db_pool.clone()));
    let dismissals = Arc::new(DismissalRepository::new(db_pool.clone()));
    let prep_artifacts = Arc::new(PrepArtifactRepository::new(db_pool.clone()));

    let schedule_store: Arc<dyn ScheduleStore> = schedules.clone();
    let account_store: Arc<dyn AccountStore> = accounts.clone();

    // Start the background sweep (at most once per process)
    let driver = Arc::new(SweepDriver::new(
        engine.clone(),
        prep.clone(),
        schedule_store,
        account_store,
        Arc::new(dispatcher),
        config.sweep.clone(),
    ));
    let driver_handle = driver.start().expect("failed to start sweep driver");

    // Create application state
    let app_state = Arc::new(AppState {
        db_pool,
        engine,
        prep,
        schedules,
        accounts,
        dismissals,
        prep_artifacts,
        driver,
    });

    let app = routes::router(app_state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // In-flight sweep work is safe to abandon: sends are intent-recorded
    // before dispatch and reconciled on the next startup's first cycle.
    driver_handle.abort();
    tracing::info!("shut down");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install shutdown handler");
    tracing::info!("shutdown signal received");
}
