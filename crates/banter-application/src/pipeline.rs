//! Message exchange pipeline.
//!
//! Turns one composed turn into a remote request and the remote reply into a
//! stored message. The user's own turn is appended before any network
//! activity so it stays visible regardless of the outcome; a fault after that
//! point appends nothing further.

use std::sync::Arc;

use banter_core::error::{BanterError, Result};
use banter_core::session::Message;
use banter_interaction::data_url;
use banter_interaction::gemini::RequestPart;

use crate::gateway::ModelProvider;
use crate::session_store::SessionStore;

/// Executes send-and-receive exchanges against the remote model.
///
/// Callers are expected to keep at most one send in flight at a time; the
/// pipeline itself neither queues nor reorders requests.
pub struct ExchangePipeline {
    store: Arc<SessionStore>,
    models: Arc<dyn ModelProvider>,
}

impl ExchangePipeline {
    pub fn new(store: Arc<SessionStore>, models: Arc<dyn ModelProvider>) -> Self {
        Self { store, models }
    }

    /// Sends a composed turn and appends both sides of the exchange.
    ///
    /// `images` are data URLs in attachment order. Returns the appended model
    /// message on success.
    pub async fn send(&self, text: &str, images: &[String]) -> Result<Message> {
        if text.trim().is_empty() && images.is_empty() {
            return Err(BanterError::precondition("message is empty"));
        }
        if self.store.current_session_id().await.is_none() {
            return Err(BanterError::precondition("no session selected"));
        }

        // The model handle must be resolved before the user turn is appended:
        // a missing configuration rejects the send with nothing stored.
        let model = self.models.current_model().await?;

        let user_message = Message::user(text, images.to_vec());
        self.store.append_message(user_message).await?;

        let mut parts = Vec::with_capacity(images.len() + 1);
        if !text.trim().is_empty() {
            parts.push(RequestPart::Text(text.to_string()));
        }
        for image in images {
            let decoded = data_url::decode(image)?;
            parts.push(RequestPart::Inline {
                mime_type: decoded.mime_type,
                data: decoded.data,
            });
        }

        let reply = model.generate(&parts).await?;

        let reply_images: Vec<String> = reply
            .parts
            .iter()
            .filter(|part| part.mime_type.starts_with("image/"))
            .map(|part| data_url::encode(&part.mime_type, &part.data))
            .collect();

        if reply.text.is_empty() && reply_images.is_empty() {
            return Err(BanterError::NoContent);
        }

        let model_message = Message::model(reply.text, reply_images);
        self.store.append_message(model_message.clone()).await?;
        Ok(model_message)
    }
}

/// Translates a send fault into the message shown to the user.
///
/// The deprecated-model condition gets specific guidance instead of the raw
/// service error.
pub fn user_facing_message(err: &BanterError) -> String {
    if err.is_model_deprecated() {
        "The selected model is no longer available. Switch to another model \
         (for example gemini-1.5-flash) in the settings."
            .to_string()
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use banter_core::session::MessageRole;
    use banter_infrastructure::chat_schema;
    use banter_infrastructure::document_store::DocumentStore;
    use banter_infrastructure::repositories::{StoreConfigRepository, StoreSessionRepository};
    use banter_interaction::gemini::{GenerateContent, ModelReply, ReplyPart};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct StubModel {
        outcome: Mutex<Option<Result<ModelReply>>>,
        captured: Mutex<Vec<RequestPart>>,
    }

    impl StubModel {
        fn replying(reply: ModelReply) -> Arc<Self> {
            Arc::new(Self {
                outcome: Mutex::new(Some(Ok(reply))),
                captured: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: BanterError) -> Arc<Self> {
            Arc::new(Self {
                outcome: Mutex::new(Some(Err(err))),
                captured: Mutex::new(Vec::new()),
            })
        }

        fn parts(&self) -> Vec<RequestPart> {
            self.captured.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerateContent for StubModel {
        async fn generate(&self, parts: &[RequestPart]) -> Result<ModelReply> {
            *self.captured.lock().unwrap() = parts.to_vec();
            self.outcome
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(ModelReply::default()))
        }
    }

    /// Echoes every inline request part back as a reply part.
    struct EchoModel;

    #[async_trait]
    impl GenerateContent for EchoModel {
        async fn generate(&self, parts: &[RequestPart]) -> Result<ModelReply> {
            let echoed = parts
                .iter()
                .filter_map(|part| match part {
                    RequestPart::Inline { mime_type, data } => Some(ReplyPart {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    }),
                    RequestPart::Text(_) => None,
                })
                .collect();
            Ok(ModelReply {
                text: "echoed".to_string(),
                parts: echoed,
            })
        }
    }

    struct StubProvider {
        model: Arc<dyn GenerateContent>,
    }

    #[async_trait]
    impl ModelProvider for StubProvider {
        async fn current_model(&self) -> Result<Arc<dyn GenerateContent>> {
            Ok(self.model.clone())
        }
    }

    async fn store_in(dir: &TempDir) -> Arc<SessionStore> {
        let store = Arc::new(DocumentStore::open(dir.path(), &chat_schema()).await.unwrap());
        let sessions = Arc::new(StoreSessionRepository::new(store.clone()));
        let config = Arc::new(StoreConfigRepository::new(store));
        let session_store = SessionStore::new(sessions, config);
        session_store.load_sessions().await.unwrap();
        session_store
    }

    fn pipeline_with(store: Arc<SessionStore>, model: Arc<dyn GenerateContent>) -> ExchangePipeline {
        ExchangePipeline::new(store, Arc::new(StubProvider { model }))
    }

    fn text_reply(text: &str) -> ModelReply {
        ModelReply {
            text: text.to_string(),
            parts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn successful_send_appends_user_then_model_message() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let pipeline = pipeline_with(store.clone(), StubModel::replying(text_reply("hi there")));

        let before = store.current_session().await.unwrap().messages.len();
        pipeline.send("hello", &[]).await.unwrap();

        let session = store.current_session().await.unwrap();
        assert_eq!(session.messages.len(), before + 2);

        let user = &session.messages[before];
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.content, "hello");
        assert!(user.images.is_empty());

        let model = &session.messages[before + 1];
        assert_eq!(model.role, MessageRole::Model);
        assert_eq!(model.content, "hi there");
        assert!(model.images.is_empty());
    }

    #[tokio::test]
    async fn empty_send_is_rejected_without_appending() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let pipeline = pipeline_with(store.clone(), StubModel::replying(text_reply("unused")));

        let err = pipeline.send("   ", &[]).await.unwrap_err();
        assert!(err.is_precondition());
        assert!(store.current_session().await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn send_without_a_session_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        store.select_session(None).await;
        let pipeline = pipeline_with(store.clone(), StubModel::replying(text_reply("unused")));

        let err = pipeline.send("hello", &[]).await.unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(err.to_string(), "no session selected");
    }

    #[tokio::test]
    async fn unconfigured_gateway_rejects_before_appending() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let gateway = Arc::new(crate::gateway::ConfigGateway::new());
        let pipeline = ExchangePipeline::new(store.clone(), gateway);

        let err = pipeline.send("hello", &[]).await.unwrap_err();
        assert!(matches!(err, BanterError::NotInitialized));
        assert!(store.current_session().await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn remote_fault_leaves_only_the_user_message() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let model = StubModel::failing(BanterError::RemoteService {
            message: "gemini-pro-vision has been deprecated".to_string(),
            model_deprecated: true,
        });
        let pipeline = pipeline_with(store.clone(), model);

        let err = pipeline.send("hello", &[]).await.unwrap_err();
        assert!(err.is_model_deprecated());
        assert!(user_facing_message(&err).contains("Switch to another model"));

        let session = store.current_session().await.unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn empty_reply_is_a_no_content_fault() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let pipeline = pipeline_with(store.clone(), StubModel::replying(ModelReply::default()));

        let err = pipeline.send("hello", &[]).await.unwrap_err();
        assert!(matches!(err, BanterError::NoContent));
        assert_eq!(store.current_session().await.unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn request_parts_carry_text_then_images_in_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let model = StubModel::replying(text_reply("ok"));
        let pipeline = pipeline_with(store.clone(), model.clone());

        let png = data_url::encode("image/png", b"png-bytes");
        let jpeg = data_url::encode("image/jpeg", b"jpeg-bytes");
        pipeline.send("look at these", &[png, jpeg]).await.unwrap();

        let parts = model.parts();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], RequestPart::Text("look at these".to_string()));
        assert_eq!(
            parts[1],
            RequestPart::Inline {
                mime_type: "image/png".to_string(),
                data: b"png-bytes".to_vec(),
            }
        );
        assert_eq!(
            parts[2],
            RequestPart::Inline {
                mime_type: "image/jpeg".to_string(),
                data: b"jpeg-bytes".to_vec(),
            }
        );
    }

    #[tokio::test]
    async fn echoed_images_round_trip_byte_identically() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let pipeline = pipeline_with(store.clone(), Arc::new(EchoModel));

        let original = data_url::encode("image/png", b"\x89PNG\r\n\x1a\npayload");
        pipeline.send("echo this", &[original.clone()]).await.unwrap();

        let session = store.current_session().await.unwrap();
        let model_message = session.messages.last().unwrap();
        assert_eq!(model_message.images, vec![original]);
    }

    #[tokio::test]
    async fn non_image_inline_parts_are_filtered_out() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let reply = ModelReply {
            text: "mixed".to_string(),
            parts: vec![
                ReplyPart {
                    mime_type: "audio/ogg".to_string(),
                    data: b"sound".to_vec(),
                },
                ReplyPart {
                    mime_type: "image/webp".to_string(),
                    data: b"frame".to_vec(),
                },
            ],
        };
        let pipeline = pipeline_with(store.clone(), StubModel::replying(reply));

        let message = pipeline.send("hello", &[]).await.unwrap();
        assert_eq!(message.images.len(), 1);
        assert!(message.images[0].starts_with("data:image/webp;base64,"));
    }
}
