//! Remote generative service integration for Banter.

pub mod data_url;
pub mod gemini;

pub use data_url::InlineImage;
pub use gemini::{GeminiClient, GenerateContent, ModelHandle, ModelReply, ReplyPart, RequestPart};
