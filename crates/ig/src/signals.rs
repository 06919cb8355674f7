//! Signal handling for graceful shutdown.
//!
//! A first SIGINT/SIGTERM (Ctrl+C on Windows) asks the plugins to shut down
//! at the end of the current frame; a second one exits immediately.

use tokio::signal;
use tracing::info;

/// Waits for a termination signal and logs it.
///
/// # Returns
///
/// `Ok(())` once a signal arrived, or an error if the handlers could not be
/// installed.
pub async fn wait_for_shutdown_signal() -> Result<(), Box<dyn std::error::Error>> {
    wait_for_shutdown_signal_silent().await?;
    info!("📡 Received shutdown signal - initiating graceful shutdown");
    Ok(())
}

pub async fn wait_for_shutdown_signal_silent() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    Ok(())
}
