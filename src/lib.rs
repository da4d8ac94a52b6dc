//! Library root for `desk-bot`.
//!
//! Desk-bot is an LLM-backed assistant for a ticket-tracker support chat,
//! designed to:
//! - Classify free-text messages into tracker queries (status, assignee,
//!   priority, summary, change history, project, search)
//! - Aggregate the answers into a context block for the completion model
//! - Answer bulk filter questions (open/closed/by state/by priority/top
//!   assignees) straight from the tracker
//!
//! The bot integrates with Jira Cloud for tickets and an Ollama-native or
//! OpenAI-compatible endpoint for completions. The architecture is built
//! around extensible traits that allow for different implementations of each
//! service.

#[deny(missing_docs)]
pub mod api;
pub mod base;
pub mod classify;
pub mod interaction;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the desk-bot runtime:
/// - Creates the runtime context with tracker and completion clients
/// - Binds the listen address and serves the HTTP API
pub async fn start(config: Config) -> Void {
    info!("Starting desk-bot ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
