use crate::traits::*;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Messages carrying images are sent as multi-part content with data URLs.
fn message_to_json(message: &Message) -> Value {
    if message.images.is_empty() {
        return json!({ "role": message.role, "content": message.content });
    }

    let mut parts = vec![json!({ "type": "text", "text": message.content })];
    for image in &message.images {
        parts.push(json!({
            "type": "image_url",
            "image_url": { "url": format!("data:image/png;base64,{}", image) }
        }));
    }
    json!({ "role": message.role, "content": parts })
}

fn build_body(model: &str, messages: &[Message]) -> Value {
    json!({
        "model": model,
        "messages": messages.iter().map(message_to_json).collect::<Vec<_>>(),
    })
}

fn parse_response(json: &Value) -> Result<GenerateResponse, ProviderError> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

    let content = choice["message"]["content"].as_str().map(|s| s.to_string());
    let finish_reason = choice["finish_reason"]
        .as_str()
        .unwrap_or("stop")
        .to_string();

    Ok(GenerateResponse {
        content,
        finish_reason,
    })
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(&self, messages: &[Message]) -> Result<GenerateResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_body(&self.model, messages);

        let mut request = self.client.post(&url).json(&body);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        tracing::debug!("Sending {} messages to {}", messages.len(), url);

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth(status.to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{}: {}", status, text)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_response(&json)
    }

    fn name(&self) -> &str {
        "OpenAI Compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_only_message_is_plain_string() {
        let body = build_body("gpt-4o-mini", &[Message::user("구글 열어줘")]);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["content"], "구글 열어줘");
    }

    #[test]
    fn test_image_message_uses_content_parts() {
        let msg = Message::user("1번 눌러줘").with_image("iVBORw0KGgo=");
        let body = build_body("gpt-4o-mini", &[msg]);
        let parts = body["messages"][0]["content"].as_array().unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
    }

    #[test]
    fn test_parse_response() {
        let json = json!({
            "choices": [{
                "message": { "role": "assistant", "content": "3번" },
                "finish_reason": "stop"
            }]
        });
        let response = parse_response(&json).unwrap();
        assert_eq!(response.content.as_deref(), Some("3번"));
        assert_eq!(response.finish_reason, "stop");
    }

    #[test]
    fn test_parse_response_without_choices() {
        let result = parse_response(&json!({ "error": "bad" }));
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = OpenAICompatibleProvider::new(
            "http://localhost:8080/v1/".to_string(),
            None,
            "llama3".to_string(),
        );
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
        assert_eq!(provider.model(), "llama3");
    }
}
