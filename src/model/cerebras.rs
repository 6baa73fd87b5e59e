use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};

use super::{CompletionClient, CompletionRequest, CompletionResponse, Sampling};
use crate::error::RelayError;
use crate::web::models::Message;

// A wrapper for the Cerebras chat completions API
pub struct CerebrasClient {
    api_url: String,
    api_key: String,
    sampling: Sampling,
    client: Client,
}

impl CerebrasClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        sampling: Sampling,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_url = api_url.into();
        info!("Using completion API at: {}", api_url);

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            info!("Upstream requests time out after {:?}", timeout);
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            api_url,
            api_key: api_key.into(),
            sampling,
            client,
        })
    }
}

#[async_trait]
impl CompletionClient for CerebrasClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, RelayError> {
        let payload = CompletionRequest {
            model: &self.sampling.model,
            messages,
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            max_tokens: self.sampling.max_tokens,
        };
        let body = serde_json::to_vec(&payload).map_err(RelayError::Encode)?;

        info!(
            "Sending {} messages to {} (max_tokens: {})",
            messages.len(),
            self.sampling.model,
            self.sampling.max_tokens
        );
        debug!("Payload: {}", String::from_utf8_lossy(&body));

        let request = self
            .client
            .post(&self.api_url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .body(body)
            .build()
            .map_err(RelayError::RequestBuild)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(RelayError::Transport)?;

        let status = response.status();
        let text = response.text().await.map_err(RelayError::ReadBody)?;

        if status != StatusCode::OK {
            return Err(RelayError::UpstreamStatus { status, body: text });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(RelayError::Decode)?;
        debug!(
            "Completion {} from {} with {} choice(s), first finish_reason: {:?}",
            parsed.id,
            parsed.model,
            parsed.choices.len(),
            parsed.choices.first().map(|c| (c.index, &c.finish_reason))
        );

        let reply = parsed.into_reply()?;
        info!("Response length: {} characters", reply.len());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::models::Role;
    use mockito::Matcher;
    use serde_json::json;

    fn sampling() -> Sampling {
        Sampling {
            model: "llama3.1-8b".to_string(),
            temperature: 0.8,
            top_p: 0.9,
            max_tokens: 512,
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> CerebrasClient {
        CerebrasClient::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-key",
            sampling(),
            None,
        )
        .unwrap()
    }

    fn transcript() -> Vec<Message> {
        vec![
            Message::new(Role::System, "persona"),
            Message::new(Role::User, "Hi"),
        ]
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;

        let response_body = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1694268190,
            "model": "llama3.1-8b",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }]
        }"#;

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama3.1-8b",
                "max_tokens": 512,
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body)
            .create_async()
            .await;

        let reply = client_for(&server).complete(&transcript()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn test_non_200_surfaces_status_and_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("upstream is overloaded")
            .create_async()
            .await;

        let err = client_for(&server)
            .complete(&transcript())
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, RelayError::UpstreamStatus { .. }));
        let text = err.to_string();
        assert!(text.contains("503"), "{}", text);
        assert!(text.contains("upstream is overloaded"), "{}", text);
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let err = client_for(&server)
            .complete(&transcript())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Decode(_)));
        assert!(err.to_string().starts_with("Unmarshal error"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"id": "chatcmpl-1", "choices": []}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .complete(&transcript())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::NoChoices));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_a_transport_error() {
        // Nothing listens on port 9 locally.
        let client =
            CerebrasClient::new("http://127.0.0.1:9/v1/chat/completions", "k", sampling(), None)
                .unwrap();

        let err = client.complete(&transcript()).await.unwrap_err();

        assert!(matches!(err, RelayError::Transport(_)));
        assert!(err.to_string().starts_with("API call error"));
    }
}
