use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use irremote_core::IrBackend;
use irremote_mqtt::{MqttConfig, MqttEmitter, MqttService};
use irremote_server::dry_run::LogBackend;
use irremote_server::metrics::Metrics;
use irremote_server::{apply_default_pin, router, AppState, BackendKind, ServerConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing()?;

    let cfg = ServerConfig::from_env()?;
    let (backend, mqtt) = build_backend(cfg.backend).await?;
    info!(backend = backend.name(), "IR backend selected");

    let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);
    let state = AppState::new(backend, metrics, cfg.max_body_bytes);

    tokio::spawn(apply_default_pin(
        state.dispatcher.clone(),
        cfg.default_pin,
        30,
        Duration::from_secs(1),
    ));

    let app = router(state);

    info!(addr = %cfg.http_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(cfg.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.http_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");

    if let Some(mqtt) = mqtt {
        if let Err(err) = mqtt.disconnect().await {
            warn!(?err, "MQTT disconnect failed during shutdown");
        }
    }
    Ok(())
}

// The MQTT service is handed back separately so shutdown can disconnect it.
async fn build_backend(kind: BackendKind) -> Result<(Arc<dyn IrBackend>, Option<MqttService>)> {
    match kind {
        BackendKind::Log => Ok((Arc::new(LogBackend::new()), None)),
        BackendKind::Mqtt => {
            let mqtt_cfg = MqttConfig::from_env();
            info!(host = %mqtt_cfg.host, port = mqtt_cfg.port, emitter = %mqtt_cfg.emitter_id, "Configuring MQTT client");
            let emitter_id = mqtt_cfg.emitter_id.clone();
            let mqtt = MqttService::start(mqtt_cfg);
            let emitter = MqttEmitter::new(mqtt.clone(), emitter_id);
            emitter.watch_status().await?;
            Ok((Arc::new(emitter), Some(mqtt)))
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,axum=info,hyper=info,rumqttc=warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(?err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                tracing::error!(?err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
