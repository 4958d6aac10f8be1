//! Client for a shared document acknowledgment portal.
//!
//! Lists documents, previews them page by page and records the current
//! user's acknowledgment behind an explicit checkbox gate.
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod preview;
pub mod services;
pub mod workflow;

pub use workflow::DocumentWorkflow;
