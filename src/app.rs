/*
 * Responsibility
 * - tracing 初期化 → Config 読み込み → 依存生成 (store / AuthGate) → Router 組み立て
 * - Middleware の適用 (http / CORS)。permission guard は routes 側で handler ごとに掛ける
 * - axum::serve() で起動
 */
use std::{panic, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, http::StatusCode, response::Response};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::{Config, Storage},
    error::{AppError, error_response},
    middleware,
    repos::{
        drink_repo::{DrinkStore, PgDrinkStore},
        memory::MemoryDrinkStore,
    },
    services::auth::build_auth_gate,
    state::AppState,
};

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,drinks_api=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");
        default_hook(info);
    }));
}

pub async fn run() -> Result<()> {
    init_tracing();
    init_panic_hook();

    let config = Config::from_env()?;
    tracing::info!(
        "starting drinks API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let drinks: Arc<dyn DrinkStore> = match &config.storage {
        Storage::Postgres {
            url,
            max_connections,
        } => {
            let store = PgDrinkStore::connect(url, *max_connections)
                .await
                .context("connecting to database")?;
            store.migrate().await.context("running migrations")?;
            Arc::new(store)
        }
        Storage::Memory => {
            tracing::warn!("using in-memory drink store; data is lost on restart");
            Arc::new(MemoryDrinkStore::new())
        }
    };
    tracing::info!(backend = drinks.backend_name(), "drink store ready");

    let auth = build_auth_gate(&config.auth).context("configuring verification keys")?;

    Ok(AppState::new(drinks, auth))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::routes(&state.auth)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    let router = middleware::http::apply(router, config);
    middleware::cors::apply(router, config)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
