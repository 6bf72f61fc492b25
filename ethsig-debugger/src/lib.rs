//! Signature debugger service.
//!
//! A thin JSON layer over [`ethsig_evm::SignatureVerifier`]: it parses
//! caller input, routes it to the configured network, and reports either a
//! verdict or, for failed personal messages, the likely signing mistake.
//!
//! # Modules
//!
//! - [`handlers`] - Axum route handlers and router builder
//! - [`error`] - HTTP error mapping
//! - [`config`] - TOML configuration with environment variable expansion

pub mod config;
pub mod error;
pub mod handlers;

pub use handlers::{DebuggerState, debugger_router};
