//! CLI command handlers.

pub mod chat;
pub mod config;
pub mod explain;
pub mod lab;
pub mod progress;
pub mod quiz;
pub mod topics;
