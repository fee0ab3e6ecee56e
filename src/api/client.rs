//! HTTP client for the chat backend
//!
//! Wraps reqwest::Client with base-URL handling and uniform status checks.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::ApiError;
use super::ChatApi;
use crate::config::Config;
use crate::models::{Conversation, Message};

// -- Response envelopes --

#[derive(Debug, Deserialize)]
struct ConversationsResponse {
    conversations: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: Message,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    content: &'a str,
}

/// Client for the four conversation endpoints.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base: Url,
}

impl ChatClient {
    /// Build a client from the effective configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(config.api_base())
            .with_context(|| format!("Invalid API URL '{}'", config.api_url))?;
        if base.cannot_be_a_base() {
            bail!("API URL '{}' cannot be used as a base URL", config.api_url);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, base })
    }

    /// `{base}/api/conversations/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").push("conversations");
            path.extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                method: "GET",
                url: url.to_string(),
                source,
            })?;

        decode(check_response(resp, &url).await?, &url).await
    }
}

impl ChatApi for ChatClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let body: ConversationsResponse = self.get_json(self.endpoint(&[])).await?;
        Ok(body.conversations)
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(&[conversation_id, "messages"]);
        let body: MessagesResponse = self.get_json(url).await?;
        Ok(body.messages)
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        let url = self.endpoint(&[conversation_id, "messages"]);
        tracing::debug!("POST {}", url);

        let resp = self
            .http
            .post(url.clone())
            .json(&SendMessageRequest { content })
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                method: "POST",
                url: url.to_string(),
                source,
            })?;

        let body: MessageResponse = decode(check_response(resp, &url).await?, &url).await?;
        Ok(body.message)
    }

    async fn mark_read(&self, conversation_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&[conversation_id, "read"]);
        tracing::debug!("PATCH {}", url);

        let resp = self
            .http
            .patch(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                method: "PATCH",
                url: url.to_string(),
                source,
            })?;

        // Body is implementation-defined; only the status matters.
        check_response(resp, &url).await?;
        Ok(())
    }
}

/// Check HTTP response status code and return a clear error on failure.
async fn check_response(
    resp: reqwest::Response,
    url: &Url,
) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::status(status.as_u16(), url.as_str(), &body));
    }
    Ok(resp)
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response, url: &Url) -> Result<T, ApiError> {
    resp.json().await.map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}
