//! Unified OpenAI-compatible provider.
//!
//! A single struct that handles chat completions for every backend the
//! classifier can run against. Providers are distinguished only by base
//! URL and API key; the wire format is the standard `/chat/completions`
//! schema including function/tool calls.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

use seatwatch_core::error::{Result, SeatwatchError};
use seatwatch_core::traits::{GenerateParams, Provider};
use seatwatch_core::types::{
    FunctionCall, Message, ProviderResponse, ToolCall, ToolDefinition, Usage,
};

pub struct OpenAiCompatibleProvider {
    name: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: &str,
        api_key: String,
        base_url: String,
        request_timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| SeatwatchError::Http(format!("client build: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            api_key,
            base_url,
            client,
        })
    }

    fn build_body(
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Value {
        let mut body = json!({
            "model": params.model,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "messages": serde_json::to_value(messages).unwrap_or_default(),
        });

        if !tools.is_empty() {
            let tool_defs: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tool_defs);
        }

        body
    }
}

/// Parse a `/chat/completions` response body into a `ProviderResponse`.
pub fn parse_chat_response(json: &Value) -> Result<ProviderResponse> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| SeatwatchError::Provider("No choices in response".into()))?;

    let content = choice["message"]["content"].as_str().map(String::from);

    let tool_calls = if let Some(tc) = choice["message"]["tool_calls"].as_array() {
        tc.iter()
            .filter_map(|t| {
                Some(ToolCall {
                    id: t["id"].as_str().unwrap_or("").to_string(),
                    call_type: "function".to_string(),
                    function: FunctionCall {
                        name: t["function"]["name"].as_str()?.to_string(),
                        arguments: t["function"]["arguments"].as_str()?.to_string(),
                    },
                })
            })
            .collect()
    } else {
        vec![]
    };

    let usage = json["usage"].as_object().map(|u| Usage {
        prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        completion_tokens: u
            .get("completion_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32,
        total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
    });

    Ok(ProviderResponse {
        content,
        tool_calls,
        finish_reason: choice["finish_reason"].as_str().map(String::from),
        usage,
    })
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        if self.api_key.is_empty() {
            return Err(SeatwatchError::ApiKeyMissing(self.name.clone()));
        }

        let body = Self::build_body(messages, tools, params);
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(
            "{}: POST {} ({} message(s), {} tool(s))",
            self.name,
            url,
            messages.len(),
            tools.len()
        );

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("{}: connection to {} failed: {}", self.name, url, e);
                SeatwatchError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!("{}: API error {}: {}", self.name, status, text);
            return Err(SeatwatchError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| SeatwatchError::Http(e.to_string()))?;

        parse_chat_response(&json)
    }
}
