//! Core domain types for Banter.
//!
//! This crate holds the "pure" domain layer: conversation models, the shared
//! error type, configuration and account records, and the repository traits
//! the storage layer implements.

pub mod command;
pub mod config;
pub mod error;
pub mod ids;
pub mod log;
pub mod repository;
pub mod session;
pub mod user;

// Re-export common error type
pub use error::{BanterError, Result};
