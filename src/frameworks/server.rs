// Framework bootstrap for the match engine runtime.

use crate::frameworks::config;
use crate::interface_adapters::region::OpenRegionGuard;
use crate::interface_adapters::routes;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::storage::JsonFileStore;
use crate::use_cases::MatchRegistry;

use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state().await?;
    let registry = state.registry.clone();

    let app = routes::app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling.
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let store = Arc::new(
        JsonFileStore::open(config::data_dir())
            .await
            .map_err(std::io::Error::other)?,
    );
    let guard = Arc::new(OpenRegionGuard);

    // The registry owns the arena catalog and every live match task.
    let registry = Arc::new(MatchRegistry::new(
        config::registry_settings(),
        store.clone(),
        guard,
    ));
    registry.load_arenas().await;

    Ok(Arc::new(AppState { registry, store }))
}

// Force-end every live match before the process exits.
async fn shutdown_signal(registry: Arc<MatchRegistry>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested, ending all matches");
        registry.end_all().await;
    }
}
