//! Twin entrypoint: search, retrain and report on a JSON pair dataset.

use mimalloc::MiMalloc;
use tokio::signal;

use twin::config::Config;
use twin::device::probe_capabilities;
use twin::pipeline;
use twin::training::CancelFlag;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let capabilities = probe_capabilities()?;
    tracing::info!(
        device = %capabilities.kind,
        accelerators = capabilities.accelerator_count,
        fallback = capabilities.fallback_reason.as_deref().unwrap_or("none"),
        dataset = %config.dataset_path.display(),
        "Twin starting"
    );

    let cancel = CancelFlag::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let device = capabilities.device().clone();
    let (_, report) =
        tokio::task::spawn_blocking(move || pipeline::run(&config, &device, &cancel)).await??;

    tracing::info!(
        best = %report.search.best,
        search_score = report.search.best_score,
        val_accuracy = report.validation.accuracy,
        "Twin finished"
    );
    Ok(())
}

async fn cancel_on_signal(cancel: CancelFlag) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, cancelling after the current batch");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, cancelling after the current batch");
        }
    }

    cancel.cancel();
}
