use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use vigil_engine::AlertingEngine;
use vigil_server::config;
use vigil_server::notify::build_dispatcher;
use vigil_server::probe::SystemProbe;
use vigil_server::rest::{self, AppState};
use vigil_server::scheduler::EvaluationTask;
use vigil_server::shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let path = PathBuf::from(std::env::var("VIGIL_CONFIG").unwrap_or_else(|_| "vigil.yml".into()));
    let cfg = config::load_or_default(&path).with_context(|| format!("loading {}", path.display()))?;
    tracing::info!(config = %path.display(), rules = cfg.rules.len(), "configuration loaded");

    let dispatcher = build_dispatcher(&cfg.notifications).context("building notification channels")?;
    let engine = Arc::new(AlertingEngine::new(cfg.engine_config(), dispatcher));
    for rule in cfg.rules.iter().cloned() {
        engine
            .add_rule(rule)
            .context("seeding rules from configuration")?;
    }

    let probe = Arc::new(SystemProbe::new());
    let scheduler = cfg.scheduler.enabled.then(|| {
        EvaluationTask {
            interval: Duration::from_secs(cfg.scheduler.interval_seconds),
            engine: engine.clone(),
            source: probe.clone(),
        }
        .spawn()
    });

    let app = rest::router(AppState {
        engine: engine.clone(),
        probe,
    });
    let listener = tokio::net::TcpListener::bind(cfg.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.listen_addr))?;
    tracing::info!(addr = %cfg.listen_addr, "REST server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("REST server failed")?;

    if let Some(task) = scheduler {
        task.abort();
    }
    tracing::info!("stopped");
    Ok(())
}
