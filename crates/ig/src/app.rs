//! Main application logic and lifecycle management.
//!
//! The `Application` owns the plugin manager and drives it from a fixed-rate
//! frame loop. The whole scene lives on the frame thread; the only other
//! task is the UDP receiver feeding the host link.

use crate::config::AppConfig;
use crate::logging::display_banner;
use crate::signals::{wait_for_shutdown_signal, wait_for_shutdown_signal_silent};
use crate::transport::UdpHostTransport;
use ig_plugins::{register_standard_plugins, DefinitionsPlugin, HostLinkPlugin};
use plugin_system::{PluginManager, PluginState};
use std::time::Instant;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Plugins and their lifecycle
    manager: PluginManager,
}

impl Application {
    /// Creates the application from a validated configuration.
    ///
    /// Binds the Host link and registers the standard plugins.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration with CLI overrides applied
    ///
    /// # Returns
    ///
    /// A configured `Application` ready to run, or an error if the socket
    /// could not be bound or the plugins could not be registered.
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config
            .validate()
            .map_err(|e| format!("Configuration validation failed: {e}"))?;
        info!("✅ Configuration validated successfully");

        display_banner();

        let transport = UdpHostTransport::bind(config.bind_address()?, config.host_address()?).await?;
        info!("📡 Listening for the Host on {}", transport.local_addr()?);

        let host_link = HostLinkPlugin::new(
            config.cigi_version(),
            config.outgoing_byte_order(),
            Box::new(transport),
        )?;
        let definitions = match &config.definitions.path {
            Some(path) => DefinitionsPlugin::from_file(path.clone()),
            None => DefinitionsPlugin::empty(),
        };

        let mut manager = PluginManager::new();
        register_standard_plugins(&mut manager, host_link, definitions)?;
        info!(
            "🔌 Plugins in execution order: {}",
            manager.execution_order()?.join(" -> ")
        );

        Ok(Self { config, manager })
    }

    /// Runs frames until the plugins reach `Exit`.
    ///
    /// A shutdown signal or the configured frame limit asks the plugins to
    /// quit; they finish the current frame, run `Shutdown` and stop. A second
    /// signal exits the process immediately.
    ///
    /// # Returns
    ///
    /// `Ok(())` after a clean shutdown, or the error of a plugin that failed
    /// during startup.
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        let mut ticker = interval(self.config.frame_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = wait_for_shutdown_signal();
        tokio::pin!(shutdown);
        let mut signalled = false;

        let frame_limit = self.config.frame.frame_limit;
        let mut frames: u64 = 0;
        let mut last_frame = Instant::now();
        let mut state = self.manager.state();

        info!("✅ Image generator is running");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        while state != PluginState::Exit {
            tokio::select! {
                _ = ticker.tick() => {}
                result = &mut shutdown, if !signalled => {
                    signalled = true;
                    if let Err(e) = result {
                        error!("❌ Failed to install signal handlers: {}", e);
                    }
                    self.manager.request_quit();
                    tokio::spawn(async {
                        if wait_for_shutdown_signal_silent().await.is_ok() {
                            warn!("Shutdown signal received again! Exiting now.");
                            std::process::exit(1);
                        }
                    });
                    continue;
                }
            }

            let now = Instant::now();
            let delta_time = now.duration_since(last_frame).as_secs_f64();
            last_frame = now;

            let ran = state;
            state = self.manager.tick(delta_time)?;
            if ran.is_running() {
                frames += 1;
                if frame_limit.is_some_and(|limit| frames >= limit) {
                    info!("🏁 Frame limit of {} reached", frames);
                    self.manager.request_quit();
                }
            }
        }

        info!("📊 Ran {} frames", frames);
        info!("✅ Image generator shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.host.bind_address);
        info!(
            "  🎯 Host address: {}",
            self.config
                .host
                .host_address
                .as_deref()
                .unwrap_or("latest sender")
        );
        info!("  📡 CIGI version: {}", self.config.cigi_version());
        info!("  ⏱️ Frame rate: {} Hz", self.config.frame.rate_hz);
        if let Some(path) = &self.config.definitions.path {
            info!("  📖 Definitions: {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_config(frames: u64) -> AppConfig {
        let mut config = AppConfig::default();
        config.host.bind_address = "127.0.0.1:0".to_string();
        config.frame.rate_hz = 500.0;
        config.frame.frame_limit = Some(frames);
        config
    }

    #[tokio::test]
    async fn runs_to_the_frame_limit_and_exits() {
        let app = Application::new(loopback_config(5)).await.unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), app.run())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = loopback_config(1);
        config.logging.level = "loud".to_string();
        assert!(Application::new(config).await.is_err());
    }

    #[tokio::test]
    async fn missing_definitions_fail_startup() {
        let mut config = loopback_config(1);
        config.definitions.path = Some("/nonexistent/ig_definitions.toml".into());
        let app = Application::new(config).await.unwrap();
        assert!(app.run().await.is_err());
    }
}
