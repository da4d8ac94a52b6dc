//! Runtime services and shared state for desk-bot.

use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::{
    api,
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{llm::LlmClient, tracker::TrackerClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration, the tracker client, and the
/// completion client. It is designed to be trivially cloneable, allowing it
/// to be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The tracker client instance.
    pub tracker: TrackerClient,
    /// The completion client instance.
    pub llm: LlmClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the tracker client.
        let tracker = TrackerClient::jira(&config)?;

        // Initialize the completion client.
        let llm = LlmClient::http(&config)?;

        Ok(Self { config, tracker, llm })
    }

    /// Bind the listen address and serve the HTTP API until shutdown.
    pub async fn start(&self) -> Void {
        let listener = TcpListener::bind(self.config.listen_addr.as_str()).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, api::router(self.clone())).with_graceful_shutdown(shutdown_signal()).await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
}
