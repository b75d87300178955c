//! Gemini REST client.
//!
//! Talks to the `generateContent` endpoint directly over HTTP. Requests carry
//! the user text followed by inline image parts; replies are normalized into
//! text plus raw inline payloads for the pipeline to filter and re-encode.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use banter_core::config::GenerationOptions;
use banter_core::error::{BanterError, Result};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Upper bound on a single remote call; a hung connection surfaces as a
/// remote-service fault instead of stalling forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One part of an outgoing request, in send order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Text(String),
    Inline { mime_type: String, data: Vec<u8> },
}

/// An inline payload returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPart {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A normalized model reply: all text parts concatenated, inline parts in
/// response order. Both may be empty; deciding whether that is an error is
/// the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub parts: Vec<ReplyPart>,
}

/// A ready-to-call generative model.
#[async_trait]
pub trait GenerateContent: Send + Sync {
    async fn generate(&self, parts: &[RequestPart]) -> Result<ModelReply>;
}

/// HTTP client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BanterError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    /// Overrides the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Binds the client to a model and its generation options.
    pub fn model(&self, model_name: impl Into<String>, options: GenerationOptions) -> ModelHandle {
        ModelHandle {
            client: self.clone(),
            model: model_name.into(),
            options,
        }
    }
}

/// A client bound to one model identifier and its generation options.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    client: GeminiClient,
    model: String,
    options: GenerationOptions,
}

impl ModelHandle {
    pub fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<ModelReply> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.client.base_url,
            model = self.model,
            api_key = self.client.api_key
        );

        let response = self
            .client
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| BanterError::remote(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| BanterError::remote(format!("failed to parse response: {err}")))?;

        extract_reply(parsed)
    }
}

#[async_trait]
impl GenerateContent for ModelHandle {
    async fn generate(&self, parts: &[RequestPart]) -> Result<ModelReply> {
        if parts.is_empty() {
            return Err(BanterError::precondition(
                "a request must include text or at least one image",
            ));
        }

        let wire_parts = parts
            .iter()
            .map(|part| match part {
                RequestPart::Text(text) => Part::Text { text: text.clone() },
                RequestPart::Inline { mime_type, data } => Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: mime_type.clone(),
                        data: BASE64_STANDARD.encode(data),
                    },
                },
            })
            .collect();

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: wire_parts,
            }],
            generation_config: Some(self.options.clone()),
        };

        tracing::debug!("calling model {} with {} parts", self.model, parts.len());
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationOptions>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataResponse {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn extract_reply(response: GenerateContentResponse) -> Result<ModelReply> {
    let parts = response
        .candidates
        .and_then(|mut candidates| {
            if candidates.is_empty() {
                None
            } else {
                candidates.swap_remove(0).content
            }
        })
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut reply = ModelReply::default();
    for part in parts {
        if let Some(text) = part.text {
            reply.text.push_str(&text);
        }
        if let Some(inline) = part.inline_data {
            let data = BASE64_STANDARD
                .decode(inline.data.as_bytes())
                .map_err(|e| BanterError::remote(format!("malformed inline data: {e}")))?;
            reply.parts.push(ReplyPart {
                mime_type: inline.mime_type,
                data,
            });
        }
    }
    Ok(reply)
}

fn map_http_error(status: StatusCode, body: &str) -> BanterError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| format!("HTTP {status}: {body}"));

    BanterError::RemoteService {
        model_deprecated: is_deprecated_message(&message),
        message,
    }
}

fn is_deprecated_message(message: &str) -> bool {
    message.to_lowercase().contains("has been deprecated")
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_core::config::ResponseModality;
    use serde_json::json;

    #[test]
    fn request_serializes_to_the_wire_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: "hello".to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineDataPayload {
                            mime_type: "image/png".to_string(),
                            data: BASE64_STANDARD.encode(b"png-bytes"),
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationOptions {
                temperature: Some(0.5),
                response_modalities: vec![ResponseModality::Text, ResponseModality::Image],
                ..Default::default()
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], json!("user"));
        assert_eq!(value["contents"][0]["parts"][0], json!({ "text": "hello" }));
        assert_eq!(
            value["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            json!("image/png")
        );
        assert_eq!(value["generationConfig"]["temperature"], json!(0.5));
        assert_eq!(
            value["generationConfig"]["responseModalities"],
            json!(["Text", "Image"])
        );
        // Unset options stay off the wire.
        assert!(value["generationConfig"].get("topK").is_none());
    }

    #[test]
    fn reply_extraction_collects_text_and_inline_parts() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "hi " },
                        { "text": "there" },
                        { "inlineData": { "mimeType": "image/png", "data": BASE64_STANDARD.encode(b"pixels") } }
                    ]
                }
            }]
        });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let reply = extract_reply(response).unwrap();

        assert_eq!(reply.text, "hi there");
        assert_eq!(reply.parts.len(), 1);
        assert_eq!(reply.parts[0].mime_type, "image/png");
        assert_eq!(reply.parts[0].data, b"pixels");
    }

    #[test]
    fn empty_candidates_yield_an_empty_reply() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        let reply = extract_reply(response).unwrap();
        assert!(reply.text.is_empty());
        assert!(reply.parts.is_empty());

        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_reply(response).unwrap(), ModelReply::default());
    }

    #[test]
    fn deprecated_model_errors_are_flagged() {
        let body = json!({
            "error": {
                "code": 404,
                "message": "Gemini 1.0 Pro Vision has been deprecated on July 12, 2024.",
                "status": "NOT_FOUND"
            }
        })
        .to_string();

        let err = map_http_error(StatusCode::NOT_FOUND, &body);
        assert!(err.is_model_deprecated());
        match err {
            BanterError::RemoteService { message, .. } => {
                assert!(message.contains("NOT_FOUND"));
                assert!(message.contains("has been deprecated"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ordinary_http_errors_are_not_flagged() {
        let body = json!({
            "error": { "code": 500, "message": "internal failure", "status": "INTERNAL" }
        })
        .to_string();
        let err = map_http_error(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(!err.is_model_deprecated());

        // Non-JSON bodies still produce a readable message.
        let err = map_http_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match err {
            BanterError::RemoteService { message, .. } => assert!(message.contains("502")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
