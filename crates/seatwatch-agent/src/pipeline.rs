//! Pipeline orchestrator.
//!
//! One run: fetch the page, classify the text (which may notify), fold the
//! result into a `RunStatus` for the scheduler's log. Failures at any stage
//! are contained here as status values; nothing propagates upward, so one
//! bad run can never take down the recurring schedule.

use std::sync::Arc;

use seatwatch_core::traits::Fetcher;
use seatwatch_core::types::{MatchQuery, RunStatus, ScrapeResult};

use crate::classifier::AvailabilityClassifier;

/// Immutable per-process wiring for the scrape → classify → notify run.
pub struct Monitor {
    fetcher: Arc<dyn Fetcher>,
    classifier: AvailabilityClassifier,
    url: String,
    query: MatchQuery,
}

impl Monitor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        classifier: AvailabilityClassifier,
        url: impl Into<String>,
        query: MatchQuery,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            url: url.into(),
            query,
        }
    }

    /// Execute one complete run and report its status.
    pub async fn run_once(&self) -> RunStatus {
        let scraped = self.fetcher.fetch(&self.url).await;
        let text = match &scraped {
            ScrapeResult::Text(text) => text,
            ScrapeResult::Failed => {
                // Classifier and notifier are never reached on a failed scrape.
                return RunStatus::ScrapeFailed;
            }
        };

        let verdict = self.classifier.classify(text, &self.query).await;
        RunStatus::from(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use seatwatch_core::error::{Result, SeatwatchError};
    use seatwatch_core::traits::{GenerateParams, Notifier, Provider};
    use seatwatch_core::types::{
        FunctionCall, Message, NotificationOutcome, NotificationRequest, ProviderResponse,
        ToolCall, ToolDefinition,
    };

    use crate::classifier::NOTIFICATION_TOOL;

    fn params() -> GenerateParams {
        GenerateParams {
            model: "test-model".into(),
            temperature: 0.0,
            max_tokens: 256,
        }
    }

    fn query() -> MatchQuery {
        MatchQuery::new("Royal Challengers Bengaluru VS Chennai Super Kings May 03, 2025 07:30 PM")
    }

    fn recipients() -> Vec<String> {
        vec!["alice@example.com".into(), "bob@example.com".into()]
    }

    fn tool_call_response() -> ProviderResponse {
        ProviderResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                call_type: "function".into(),
                function: FunctionCall {
                    name: NOTIFICATION_TOOL.into(),
                    arguments: format!(
                        "{{\"message\":\"Tickets on sale now\",\"matchName\":\"{}\"}}",
                        query()
                    ),
                },
            }],
            finish_reason: Some("tool_calls".into()),
            usage: None,
        }
    }

    fn text_response(content: &str) -> ProviderResponse {
        ProviderResponse {
            content: Some(content.to_string()),
            tool_calls: vec![],
            finish_reason: Some("stop".into()),
            usage: None,
        }
    }

    /// Scripted provider: pops one queued response per chat call.
    struct ScriptedProvider {
        responses: Mutex<Vec<ProviderResponse>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(mut responses: Vec<ProviderResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _tools: &[ToolDefinition],
            _params: &GenerateParams,
        ) -> Result<ProviderResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| SeatwatchError::Provider("script exhausted".into()))
        }
    }

    /// Deterministic provider keyed on the page text, for idempotence checks.
    struct RuleProvider;

    #[async_trait]
    impl Provider for RuleProvider {
        fn name(&self) -> &str {
            "rules"
        }

        async fn chat(
            &self,
            messages: &[Message],
            tools: &[ToolDefinition],
            _params: &GenerateParams,
        ) -> Result<ProviderResponse> {
            let prompt = &messages.last().unwrap().content;
            let available = prompt.contains("Rs ") && prompt.contains("BUY TICKETS");
            if available && !tools.is_empty() {
                Ok(tool_call_response())
            } else if available {
                Ok(text_response("EMAIL_SENT: price and buy action present"))
            } else {
                Ok(text_response("NOT_AVAILABLE: no price or buy action"))
            }
        }
    }

    /// Provider that always fails, for error-path tests.
    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _tools: &[ToolDefinition],
            _params: &GenerateParams,
        ) -> Result<ProviderResponse> {
            Err(SeatwatchError::Provider("quota exceeded".into()))
        }
    }

    /// Recording notifier with a configurable outcome.
    struct RecordingNotifier {
        outcome: NotificationOutcome,
        requests: Mutex<Vec<NotificationRequest>>,
    }

    impl RecordingNotifier {
        fn delivering(sent: usize) -> Arc<Self> {
            Arc::new(Self {
                outcome: NotificationOutcome::Delivered {
                    sent,
                    failed: vec![],
                },
                requests: Mutex::new(vec![]),
            })
        }

        fn config_error() -> Arc<Self> {
            Arc::new(Self {
                outcome: NotificationOutcome::ConfigError("SMTP credentials missing".into()),
                requests: Mutex::new(vec![]),
            })
        }

        fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, request: &NotificationRequest) -> NotificationOutcome {
            self.requests.lock().unwrap().push(request.clone());
            self.outcome.clone()
        }
    }

    struct FixedFetcher(ScrapeResult);

    #[async_trait]
    impl Fetcher for FixedFetcher {
        async fn fetch(&self, _url: &str) -> ScrapeResult {
            self.0.clone()
        }
    }

    fn monitor(
        fetch: ScrapeResult,
        provider: Box<dyn Provider>,
        notifier: Arc<RecordingNotifier>,
    ) -> Monitor {
        let classifier =
            AvailabilityClassifier::new(provider, notifier, recipients(), params());
        Monitor::new(
            Arc::new(FixedFetcher(fetch)),
            classifier,
            "https://tickets.example.com/event",
            query(),
        )
    }

    const AVAILABLE_PAGE: &str = "May 03, 2025 07:30 PM Royal Challengers Bengaluru VS \
        Chennai Super Kings Rs 500-5000 BUY TICKETS May 05, 2025 Other Match SOLD OUT";

    const SOLD_OUT_PAGE: &str = "May 03, 2025 07:30 PM Royal Challengers Bengaluru VS \
        Chennai Super Kings SOLD OUT";

    #[tokio::test]
    async fn available_page_notifies_once_and_reports_email_sent() {
        let notifier = RecordingNotifier::delivering(2);
        let provider = Box::new(ScriptedProvider::new(vec![
            tool_call_response(),
            text_response("EMAIL_SENT: entry followed by price and buy action"),
        ]));
        let m = monitor(
            ScrapeResult::Text(AVAILABLE_PAGE.into()),
            provider,
            notifier.clone(),
        );

        let status = m.run_once().await;
        assert!(status.to_string().starts_with("EMAIL_SENT:"));
        assert_eq!(notifier.call_count(), 1);

        let request = notifier.requests.lock().unwrap()[0].clone();
        assert_eq!(request.recipients, recipients());
        assert!(request.subject.contains("Chennai Super Kings"));
        assert_eq!(request.body, "Tickets on sale now");
    }

    #[tokio::test]
    async fn sold_out_page_never_notifies() {
        let notifier = RecordingNotifier::delivering(2);
        let provider = Box::new(ScriptedProvider::new(vec![text_response(
            "NOT_AVAILABLE: entry shows SOLD OUT",
        )]));
        let m = monitor(
            ScrapeResult::Text(SOLD_OUT_PAGE.into()),
            provider,
            notifier.clone(),
        );

        let status = m.run_once().await;
        assert!(status.to_string().starts_with("NOT_AVAILABLE:"));
        assert_eq!(notifier.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_scrape_skips_classifier_and_notifier() {
        let notifier = RecordingNotifier::delivering(2);
        let provider = ScriptedProvider::new(vec![]);
        let classifier = AvailabilityClassifier::new(
            Box::new(provider),
            notifier.clone(),
            recipients(),
            params(),
        );
        let m = Monitor::new(
            Arc::new(FixedFetcher(ScrapeResult::Failed)),
            classifier,
            "https://tickets.example.com/event",
            query(),
        );

        let status = m.run_once().await;
        assert_eq!(status.to_string(), "SCRAPE_FAILED");
        assert_eq!(notifier.call_count(), 0);
        // provider script is empty; a chat call would have errored the status
    }

    #[tokio::test]
    async fn provider_failure_maps_to_error_and_never_notifies() {
        let notifier = RecordingNotifier::delivering(2);
        let m = monitor(
            ScrapeResult::Text(AVAILABLE_PAGE.into()),
            Box::new(FailingProvider),
            notifier.clone(),
        );

        let status = m.run_once().await;
        let s = status.to_string();
        assert!(s.starts_with("ERROR:"), "got: {s}");
        assert!(!s.starts_with("NOT_AVAILABLE:"));
        assert_eq!(notifier.call_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_tool_calls_in_one_turn_notify_once() {
        let mut double = tool_call_response();
        let mut second = double.tool_calls[0].clone();
        second.id = "call_2".into();
        double.tool_calls.push(second);

        let notifier = RecordingNotifier::delivering(2);
        let provider = Box::new(ScriptedProvider::new(vec![
            double,
            text_response("EMAIL_SENT: done"),
        ]));
        let m = monitor(
            ScrapeResult::Text(AVAILABLE_PAGE.into()),
            provider,
            notifier.clone(),
        );

        let status = m.run_once().await;
        assert!(status.to_string().starts_with("EMAIL_SENT:"));
        assert_eq!(notifier.call_count(), 1);
    }

    #[tokio::test]
    async fn classify_is_idempotent_for_the_same_text() {
        for _ in 0..2 {
            let notifier = RecordingNotifier::delivering(2);
            let m = monitor(
                ScrapeResult::Text(AVAILABLE_PAGE.into()),
                Box::new(RuleProvider),
                notifier.clone(),
            );
            let status = m.run_once().await;
            assert!(status.to_string().starts_with("EMAIL_SENT:"));
        }

        for _ in 0..2 {
            let notifier = RecordingNotifier::delivering(2);
            let m = monitor(
                ScrapeResult::Text(SOLD_OUT_PAGE.into()),
                Box::new(RuleProvider),
                notifier.clone(),
            );
            let status = m.run_once().await;
            assert!(status.to_string().starts_with("NOT_AVAILABLE:"));
        }
    }

    #[tokio::test]
    async fn missing_mail_credentials_surface_as_error_status() {
        let notifier = RecordingNotifier::config_error();
        let provider = Box::new(ScriptedProvider::new(vec![
            tool_call_response(),
            text_response("EMAIL_SENT: done"),
        ]));
        let m = monitor(
            ScrapeResult::Text(AVAILABLE_PAGE.into()),
            provider,
            notifier.clone(),
        );

        let status = m.run_once().await;
        let s = status.to_string();
        assert!(s.starts_with("ERROR:"), "got: {s}");
        assert!(s.contains("configuration error"));
        // the notifier was consulted once and declined before any delivery
        assert_eq!(notifier.call_count(), 1);
    }

    #[tokio::test]
    async fn endless_tool_calling_is_cut_off() {
        // Script only tool calls; the loop must stop and report an error
        // rather than spin. After the first call the tool list is withdrawn,
        // so the later responses simulate a model ignoring the protocol.
        let notifier = RecordingNotifier::config_error();
        let provider = Box::new(ScriptedProvider::new(vec![
            tool_call_response(),
            tool_call_response(),
            tool_call_response(),
            tool_call_response(),
        ]));
        let m = monitor(
            ScrapeResult::Text(AVAILABLE_PAGE.into()),
            provider,
            notifier.clone(),
        );

        let status = m.run_once().await;
        assert!(status.to_string().starts_with("ERROR:"));
        assert_eq!(notifier.call_count(), 1, "only the first call dispatches");
    }
}
