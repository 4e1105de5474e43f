use anyhow::Result;

use slotwatch::config::Config;
use slotwatch::scheduler::{RunSummary, Scheduler};

use super::bootstrap::build_poller;

/// Run the watcher until slots are found or the process is interrupted
pub async fn watch(config: Config) -> Result<RunSummary> {
    let (poller, config) = build_poller(config).await?;
    let schedule = config.schedule()?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let scheduler =
        Scheduler::new(poller, schedule).with_stop_on_found(config.polling.stop_on_found);

    Ok(scheduler.run(shutdown_rx).await)
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
