use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    response::Json,
    routing::get,
    Router,
};
use mongodb::bson::doc;
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod database;
mod dtos;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use config::AppConfig;
use database::connection::get_db_client;
use middleware::auth::JwtAuth;
use services::cache::{KeyValueCache, MemoryCache, RedisCache};
use services::email_service::{ConsoleNotifier, Notifier, SmtpNotifier};
use services::otp_service::{PasswordResetService, ResetPolicy};
use services::user_store::MongoUserStore;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded: {}", config.get_config_info());

    let app_state = initialize_app_state(config).await?;
    let app = build_router(app_state.clone());

    start_server(app, &app_state.config).await
}

async fn initialize_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let db = get_db_client(&config).await?;

    let cache: Arc<dyn KeyValueCache> = match &config.redis_url {
        Some(url) => Arc::new(RedisCache::connect(url, config.cache_timeout).await?),
        None => {
            tracing::warn!("REDIS_URL not set, using the in-process cache (single instance only)");
            Arc::new(MemoryCache::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => {
            let notifier = SmtpNotifier::new(smtp, &config.mail_from, &config.mail_from_name)?;
            tracing::info!("✅ SMTP notifier ready ({}:{})", smtp.host, smtp.port);
            Arc::new(notifier)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, emails will only be logged");
            Arc::new(ConsoleNotifier)
        }
    };

    let policy = ResetPolicy {
        otp_ttl: std::time::Duration::from_secs(config.otp_ttl_secs),
        reset_token_ttl: std::time::Duration::from_secs(config.reset_token_ttl_secs),
        max_attempts: config.otp_max_attempts,
    };
    let password_reset = PasswordResetService::new(
        cache.clone(),
        Arc::new(MongoUserStore::new(&db)),
        notifier.clone(),
        policy,
    );

    Ok(AppState {
        db,
        auth: Arc::new(JwtAuth::new(&config.jwt_secret, config.jwt_ttl_secs)),
        config: Arc::new(config),
        cache,
        notifier,
        password_reset: Arc::new(password_reset),
    })
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %request.method(),
            uri = %request.uri(),
        )
    });

    let auth = app_state.auth.clone();

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .nest("/api/users", routes::users::routes(auth.clone()))
        .nest("/api/insights", routes::insights::routes(auth.clone()))
        .nest("/api/team", routes::team::routes(auth.clone()))
        .nest("/api/offices", routes::offices::routes(auth.clone()))
        .nest("/api/publications", routes::publications::routes(auth.clone()))
        .nest("/api/subscribers", routes::subscribers::routes(auth.clone()))
        .nest("/api/contact-messages", routes::contact_messages::routes(auth))
        .layer(TimeoutLayer::new(app_state.config.request_timeout))
        .layer(CompressionLayer::new())
        .layer(trace)
        .layer(cors)
        .with_state(app_state)
}

async fn start_server(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 Server starting on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root_handler() -> &'static str {
    "ONCG Global API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.run_command(doc! { "ping": 1 }).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "cache": state.cache.backend(),
        "email": state.config.smtp.is_some(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
