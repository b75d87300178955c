//! Application layer for Banter.
//!
//! Wires the domain, storage, and remote-service layers into the components
//! the UI consumes: the reactive session store, the message exchange
//! pipeline, the configuration gateway, and the account service.

pub mod auth;
pub mod bootstrap;
pub mod commands;
pub mod gateway;
pub mod pipeline;
pub mod session_store;

pub use auth::AuthService;
pub use bootstrap::{App, bootstrap};
pub use commands::CommandTracker;
pub use gateway::{ConfigGateway, ModelProvider};
pub use pipeline::{ExchangePipeline, user_facing_message};
pub use session_store::SessionStore;
