use crate::config::settings::LlmSettings;
use crate::domain::ports::{GenerationRequest, TextGenerator};
use crate::utils::error::{DigestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// OpenAI 相容的 chat completions 客戶端（非串流）
pub struct OpenAiGenerator {
    client: Client,
    settings: LlmSettings,
}

impl OpenAiGenerator {
    /// 金鑰必須已經解析進 `settings.api_key`
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn build_body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.prompt},
            ],
            "stream": false,
        });

        if let Some(temperature) = self.settings.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

fn extract_content(data: &Value) -> Option<String> {
    data.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.endpoint();
        let mut http_request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .header("content-type", "application/json")
            .json(&self.build_body(request));

        if let Some(timeout) = self.settings.timeout_seconds {
            http_request = http_request.timeout(Duration::from_secs(timeout));
        }

        let response = http_request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("❌ LLM API error {}: {}", status, body);
            return Err(DigestError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let data: Value = response.json().await?;
        if let Some(usage) = data.get("usage") {
            tracing::debug!("LLM usage: {}", usage);
        }

        match extract_content(&data) {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(DigestError::generation(
                "completion",
                "Response did not contain any message content",
            )),
        }
    }
}
