//! Builders
//!
//! Fluent builders for the LibLynx configuration and client.

pub mod client;
pub mod config;

pub use client::LibLynxClientBuilder;
pub use config::{liblynx_config, LibLynxConfigBuilder, ENV_API_ROOT, ENV_CLIENT_ID, ENV_CLIENT_SECRET};
