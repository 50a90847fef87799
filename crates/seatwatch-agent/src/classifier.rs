//! Availability classifier.
//!
//! Per invocation: `Idle → Prompting → {ToolInvocation?} → Verdict`. The
//! model sees the scraped text, the exact target-event identifier, and the
//! decision procedure; it may call `send_notification` zero or one time
//! before its terminal answer. Our dispatch enforces the "once, and only
//! when available" contract even against a misbehaving model.

use std::sync::Arc;

use seatwatch_core::error::Result;
use seatwatch_core::traits::{GenerateParams, Notifier, Provider};
use seatwatch_core::types::{
    ClassificationVerdict, MatchQuery, Message, NotificationOutcome, NotificationRequest, Role,
    ToolDefinition, Verdict,
};

/// Name of the single registered tool.
pub const NOTIFICATION_TOOL: &str = "send_notification";

/// Cap on provider round-trips; a model that keeps calling tools past this
/// is treated as having produced no terminal response.
const MAX_TOOL_ROUNDS: usize = 3;

const SYSTEM_PROMPT: &str = "\
You are a ticket-availability checker for one specific event. You are given \
the full visible text of a ticket-sale page and the exact identifier of the \
target event. Decide availability with this procedure:\n\
1. Locate the exact entry for the target identifier in the page text.\n\
2. Inspect ONLY the text immediately following that entry.\n\
3. The event is AVAILABLE only if that text contains both a price range \
(for example 'Rs 500-5000') and a purchase action (for example 'BUY \
TICKETS').\n\
4. 'SOLD OUT', 'COMING SOON', or a missing price or purchase action means \
NOT available.\n\
5. Never let another event's price or status influence the target's \
verdict. If the entry is absent or the match is ambiguous, it is NOT \
available.\n\
When and only when the event is AVAILABLE, first call the send_notification \
tool exactly once with a short alert message and the exact target \
identifier, then answer with one line starting with 'EMAIL_SENT: ' followed \
by your justification. Otherwise answer with one line starting with \
'NOT_AVAILABLE: ' followed by the reason. Produce exactly one final answer.";

/// Classifier over an LLM provider with a single notification side effect.
pub struct AvailabilityClassifier {
    provider: Box<dyn Provider>,
    notifier: Arc<dyn Notifier>,
    recipients: Vec<String>,
    params: GenerateParams,
}

impl AvailabilityClassifier {
    pub fn new(
        provider: Box<dyn Provider>,
        notifier: Arc<dyn Notifier>,
        recipients: Vec<String>,
        params: GenerateParams,
    ) -> Self {
        Self {
            provider,
            notifier,
            recipients,
            params,
        }
    }

    /// Classify one page text against the target event. Total: provider
    /// failures come back as `Verdict::Error`, never as an `Err`.
    pub async fn classify(&self, text: &str, query: &MatchQuery) -> ClassificationVerdict {
        match self.classify_inner(text, query).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!("classification failed: {e}");
                ClassificationVerdict {
                    verdict: Verdict::Error,
                    status: format!("ERROR: classification failed: {e}"),
                }
            }
        }
    }

    async fn classify_inner(&self, text: &str, query: &MatchQuery) -> Result<ClassificationVerdict> {
        let tool_defs = vec![notification_tool()];
        let mut messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(user_prompt(text, query)),
        ];
        let mut outcome: Option<NotificationOutcome> = None;

        for _ in 0..MAX_TOOL_ROUNDS {
            // Withdraw the tool once its single permitted invocation happened.
            let tools: &[ToolDefinition] = if outcome.is_none() { &tool_defs } else { &[] };
            let response = self.provider.chat(&messages, tools, &self.params).await?;

            if response.tool_calls.is_empty() {
                return Ok(interpret_terminal(
                    response.content.as_deref(),
                    outcome.as_ref(),
                ));
            }

            messages.push(Message {
                role: Role::Assistant,
                content: response.content.clone().unwrap_or_default(),
                tool_call_id: None,
                tool_calls: Some(response.tool_calls.clone()),
            });

            for tc in &response.tool_calls {
                let result = if tc.function.name != NOTIFICATION_TOOL {
                    format!("Tool not found: {}", tc.function.name)
                } else if outcome.is_some() {
                    "Notification already sent for this run; do not send again.".to_string()
                } else {
                    let body = notification_body(&tc.function.arguments, query);
                    let request = NotificationRequest::for_match(query, body, &self.recipients);
                    let o = self.notifier.notify(&request).await;
                    tracing::info!("send_notification: {}", o.summary());
                    let summary = o.summary();
                    outcome = Some(o);
                    summary
                };
                messages.push(Message::tool(result, &tc.id));
            }
        }

        // Rounds exhausted without a terminal text response.
        Ok(interpret_terminal(None, outcome.as_ref()))
    }
}

/// Definition of the one callable action the model may take.
pub fn notification_tool() -> ToolDefinition {
    ToolDefinition {
        name: NOTIFICATION_TOOL.into(),
        description: "Send the ticket-availability alert email to the configured recipients. \
                      Call at most once, and only after confirming the target event is available."
            .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Alert body describing what is on sale"
                },
                "matchName": {
                    "type": "string",
                    "description": "The exact target-event identifier"
                }
            },
            "required": ["message", "matchName"]
        }),
    }
}

fn user_prompt(text: &str, query: &MatchQuery) -> String {
    format!(
        "Target event: {query}\n\nPage text:\n{text}\n\nIs the target event available?"
    )
}

/// Extract the alert body from the tool-call arguments, falling back to a
/// generic alert when the model sent malformed JSON.
fn notification_body(arguments: &str, query: &MatchQuery) -> String {
    let args: serde_json::Value = serde_json::from_str(arguments).unwrap_or_default();
    if let Some(claimed) = args["matchName"].as_str() {
        if claimed != query.as_str() {
            tracing::warn!(
                "model reported matchName '{claimed}', configured target is '{query}'"
            );
        }
    }
    args["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Tickets for {query} appear to be available right now."))
}

/// Map the terminal model output plus the notification record to a typed
/// verdict. Pure, so the "notify iff available" contract is verifiable
/// without a live model.
pub fn interpret_terminal(
    content: Option<&str>,
    outcome: Option<&NotificationOutcome>,
) -> ClassificationVerdict {
    if let Some(outcome) = outcome {
        // The tool ran, so the model committed to Available.
        return if outcome.delivered_any() {
            let mut status = format!("EMAIL_SENT: {}", outcome.summary());
            if let Some(c) = content {
                let justification = c.trim().trim_start_matches("EMAIL_SENT:").trim();
                // A contradictory terminal line is dropped rather than
                // appended; one status line carries one prefix.
                let contradicts = justification.starts_with("NOT_AVAILABLE")
                    || justification.starts_with("ERROR");
                if !justification.is_empty() && !contradicts {
                    status.push_str(" | ");
                    status.push_str(justification);
                }
            }
            ClassificationVerdict {
                verdict: Verdict::Available,
                status,
            }
        } else {
            ClassificationVerdict {
                verdict: Verdict::Error,
                status: format!(
                    "ERROR: availability confirmed but notification {}",
                    outcome.summary()
                ),
            }
        };
    }

    let Some(content) = content else {
        return ClassificationVerdict {
            verdict: Verdict::Error,
            status: "ERROR: classifier returned no terminal response".into(),
        };
    };

    let trimmed = content.trim();
    if trimmed.starts_with("EMAIL_SENT") {
        // Protocol violation: claiming a send without invoking the tool.
        return ClassificationVerdict {
            verdict: Verdict::Error,
            status: "ERROR: model reported EMAIL_SENT without invoking send_notification".into(),
        };
    }
    if trimmed.starts_with("NOT_AVAILABLE") {
        return ClassificationVerdict {
            verdict: Verdict::NotAvailable,
            status: trimmed.to_string(),
        };
    }

    // Ambiguous or unparseable terminal text counts as negative.
    ClassificationVerdict {
        verdict: Verdict::NotAvailable,
        status: format!("NOT_AVAILABLE: {trimmed}"),
    }
}
