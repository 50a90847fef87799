//! Shared types: the chat wire format spoken to LLM providers and the
//! domain values that flow through one monitoring run.

use serde::{Deserialize, Serialize};

// ── Chat wire types (OpenAI-compatible) ────────────────────

/// Message role in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// A tool-result message answering a specific tool call.
    pub fn tool(content: impl Into<String>, tool_call_id: &str) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.to_string()),
            tool_calls: None,
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

/// The function part of a tool call; arguments arrive as a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// A tool made available to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments.
    pub parameters: serde_json::Value,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One provider response: terminal text, tool calls, or both.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

// ── Domain types ───────────────────────────────────────────

/// The one sale entry being monitored: a human-readable identifier that
/// uniquely names the event including its date/time. Immutable for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery(String);

impl MatchQuery {
    pub fn new(event: impl Into<String>) -> Self {
        Self(event.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one page fetch: normalized visible text, or the absence
/// marker when the fetch failed in any way. Owned by the run that
/// produced it and dropped at end of run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeResult {
    Text(String),
    Failed,
}

impl ScrapeResult {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Failed => None,
        }
    }
}

/// Terminal classifier decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Available,
    NotAvailable,
    /// Classification itself failed; distinct from a confirmed negative
    /// for logging, equivalent to it for notification purposes.
    Error,
}

/// The classifier's terminal result: the decision plus a human-readable
/// status string carrying a stable machine-distinguishable prefix.
#[derive(Debug, Clone)]
pub struct ClassificationVerdict {
    pub verdict: Verdict,
    pub status: String,
}

/// One email fan-out, constructed if and only if the verdict is
/// `Available`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl NotificationRequest {
    /// Build the request for a confirmed match; the subject carries the
    /// exact target-event identifier.
    pub fn for_match(query: &MatchQuery, body: impl Into<String>, recipients: &[String]) -> Self {
        Self {
            recipients: recipients.to_vec(),
            subject: format!("Tickets available: {query}"),
            body: body.into(),
        }
    }
}

/// A single recipient that could not be delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub recipient: String,
    pub reason: String,
}

/// Aggregate outcome of one notification fan-out. Never persisted; it is
/// folded into the run's status string and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Credentials or transport setup missing; zero delivery attempts made.
    ConfigError(String),
    /// Delivery was attempted for every recipient.
    Delivered {
        sent: usize,
        failed: Vec<DeliveryFailure>,
    },
}

impl NotificationOutcome {
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }

    /// True when at least one recipient actually received the message.
    pub fn delivered_any(&self) -> bool {
        matches!(self, Self::Delivered { sent, .. } if *sent > 0)
    }

    /// One-line summary for logs and the tool-result message.
    pub fn summary(&self) -> String {
        match self {
            Self::ConfigError(reason) => format!("not sent, configuration error: {reason}"),
            Self::Delivered { sent, failed } if failed.is_empty() => {
                format!("delivered to {sent} recipient(s)")
            }
            Self::Delivered { sent, failed } => {
                let details: Vec<String> = failed
                    .iter()
                    .map(|f| format!("{}: {}", f.recipient, f.reason))
                    .collect();
                format!(
                    "delivered to {sent} recipient(s), {} failed ({})",
                    failed.len(),
                    details.join("; ")
                )
            }
        }
    }
}

/// Summary of one complete run, returned to the scheduler for logging.
/// The `Display` form preserves the literal status prefixes expected by
/// existing log consumers.
#[derive(Debug, Clone)]
pub enum RunStatus {
    EmailSent(String),
    NotAvailable(String),
    ScrapeFailed,
    Error(String),
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailSent(detail) => write!(f, "EMAIL_SENT: {detail}"),
            Self::NotAvailable(detail) => write!(f, "NOT_AVAILABLE: {detail}"),
            Self::ScrapeFailed => write!(f, "SCRAPE_FAILED"),
            Self::Error(detail) => write!(f, "ERROR: {detail}"),
        }
    }
}

impl From<ClassificationVerdict> for RunStatus {
    fn from(v: ClassificationVerdict) -> Self {
        match v.verdict {
            Verdict::Available => Self::EmailSent(strip_prefix(&v.status, "EMAIL_SENT:")),
            Verdict::NotAvailable => Self::NotAvailable(strip_prefix(&v.status, "NOT_AVAILABLE:")),
            Verdict::Error => Self::Error(strip_prefix(&v.status, "ERROR:")),
        }
    }
}

fn strip_prefix(status: &str, prefix: &str) -> String {
    status
        .strip_prefix(prefix)
        .map(str::trim_start)
        .unwrap_or(status)
        .to_string()
}
