#![forbid(unsafe_code)]

use anyhow::Context;
use std::sync::Arc;
use survey_rotor::config::ServerConfig;
use survey_rotor::experiment::{AssignmentSession, ExperimentRegistry, VariantAssigner};
use survey_rotor::http::{build_router, AppState};
use survey_rotor::schema::SchemaStore;
use survey_rotor::store::SqliteStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
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

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_json);

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    // Table provisioning failure is the one fatal storage error.
    let store = Arc::new(
        SqliteStore::open(&config.database_path).context("database provisioning failed")?,
    );
    info!(path = %config.database_path.display(), "database ready");

    let registry = ExperimentRegistry::builtin().context("experiment configuration invalid")?;
    let assigner = VariantAssigner::new(&registry);
    let session = AssignmentSession::new(registry, assigner, Arc::clone(&store));
    let schemas = SchemaStore::new(&config.schema_root);
    let state = AppState::new(session, store, schemas, &config.public_root);
    let app = build_router(state);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind failed on {addr}"))?;
    info!("survey-rotor listening on {addr}");

    let drain = config.shutdown_drain;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            info!("shutdown signal received, draining");
            tokio::time::sleep(drain).await;
        })
        .await
        .context("server failed")?;
    Ok(())
}
