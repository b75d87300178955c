//! Session domain types.

mod message;
mod model;

pub use message::{Message, MessageRole};
pub use model::Session;
