//! Completion model integration.

pub mod http;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Res;

// Traits.

/// Generic completion client trait that implementations must provide.
///
/// One operation: submit a prompt, get the completion text back. Keeping the
/// surface this small lets tests substitute a canned model trivially.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Submit one prompt and return the completion text.
    async fn complete(&self, prompt: &str) -> Res<String>;
}

// Structs.

/// Completion client for the application.
///
/// This is trivially cloneable and can be passed around without the need for
/// `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    /// Wrap a concrete client implementation.
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}
