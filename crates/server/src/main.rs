//! Huddle-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use fred::interfaces::ClientLike;
use huddle_api::{middleware::AppState, router as api_router};
use huddle_common::{Config, LocalBlobStore};
use huddle_core::{AttachmentService, ChatService, PermissionService};
use huddle_db::repositories::{
    AttachmentRepository, ChannelRepository, MentionRepository, MessageRepository,
    ReactionRepository,
};
use huddle_realtime::{
    PresenceSweeper, RedisPresenceTracker, RedisPubSub, RedisUnreadLedger,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting huddle-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = huddle_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    huddle_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis for presence and unread state
    info!("Connecting to Redis...");
    let fred_config = fred::types::config::Config::from_url(&config.redis.url)?;
    let redis_client = fred::clients::Client::new(fred_config, None, None, None);
    redis_client.init().await?;
    let redis_client = Arc::new(redis_client);
    info!("Connected to Redis");

    // Initialize Pub/Sub fan-out
    let pubsub = RedisPubSub::new(&config.redis.url).await?;
    pubsub.start();

    // Initialize repositories
    let db = Arc::new(db);
    let message_repo = MessageRepository::new(Arc::clone(&db));
    let attachment_repo = AttachmentRepository::new(Arc::clone(&db));
    let reaction_repo = ReactionRepository::new(Arc::clone(&db));
    let mention_repo = MentionRepository::new(Arc::clone(&db));
    let channel_repo = ChannelRepository::new(Arc::clone(&db));

    // Initialize trackers
    let presence = RedisPresenceTracker::with_ttl(
        Arc::clone(&redis_client),
        config.presence.ttl_secs as i64,
    );
    let unread = RedisUnreadLedger::new(Arc::clone(&redis_client));

    // Initialize services
    let blob_store = Arc::new(LocalBlobStore::new(
        config.storage.base_path.clone().into(),
        config.storage.base_url.clone(),
    ));
    let attachment_service = AttachmentService::new(attachment_repo.clone(), blob_store);

    let mut chat_service = ChatService::new(
        message_repo,
        attachment_repo,
        reaction_repo,
        mention_repo,
        channel_repo.clone(),
    );
    chat_service.set_event_publisher(Arc::new(pubsub.clone()));
    chat_service.set_unread_ledger(Arc::new(unread.clone()));
    chat_service.set_presence_tracker(Arc::new(presence.clone()));

    let permissions = PermissionService::new(channel_repo);

    // Start the presence sweeper
    PresenceSweeper::with_interval(
        presence.clone(),
        Duration::from_secs(config.presence.sweep_interval_secs),
    )
    .spawn();
    info!("Presence sweeper started");

    let state = AppState {
        chat_service,
        attachment_service,
        permissions,
        presence,
        unread,
        pubsub,
    };

    // Build the application router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn(huddle_api::middleware::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
