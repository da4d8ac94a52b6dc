//! Handles one inbound chat message end to end.

use tracing::{info, instrument};

use crate::base::{config::Config, types::Res};
use crate::classify::{self, filter};
use crate::service::{llm::LlmClient, tracker::TrackerClient};

use super::aggregate;

/// Resolve one user message to a response text.
///
/// Bulk filter phrasings are answered straight from the tracker, bypassing
/// the classifier and the model for that turn. Everything else goes through
/// the classifier; with no tracker intent at all, the message passes through
/// unchanged as the model prompt.
#[instrument(skip_all)]
pub async fn handle_chat_message(message: &str, tracker: &TrackerClient, llm: &LlmClient, config: &Config) -> Res<String> {
    if let Some(request) = filter::detect_filter(message) {
        info!("Filter request detected: {request:?}");
        return filter::run_filter(&request, tracker, config).await;
    }

    let queries = classify::detect_queries(message);
    info!("Detected {} tracker queries", queries.len());

    let prompt = if queries.is_empty() {
        message.to_string()
    } else {
        aggregate::build_model_prompt(message, &queries, tracker, config).await?
    };

    llm.complete(&prompt).await
}
