//! Trait seams between the pipeline stages. Each external collaborator
//! (browser, LLM runtime, mail transport) sits behind one of these so the
//! pipeline can be exercised with in-process doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Message, NotificationOutcome, NotificationRequest, ProviderResponse, ScrapeResult,
    ToolDefinition,
};

/// Sampling parameters for one chat call.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// An LLM chat-completion backend with a callable-tool protocol.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// One chat call. The contract requires exactly one terminal text
    /// response per classification; tool calls may precede it.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Result<ProviderResponse>;
}

/// Acquires the rendered visible text of one page.
///
/// Implementations must contain every failure behind the absence marker;
/// `fetch` never errors past its own boundary.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ScrapeResult;
}

/// Delivers one notification fan-out.
///
/// `notify` is total: configuration problems and per-recipient delivery
/// failures are reported through the outcome, never as an error.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, request: &NotificationRequest) -> NotificationOutcome;
}
