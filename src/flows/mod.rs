//! OAuth2 Flows
//!
//! Token endpoint grants used by the authenticator.

pub mod client_credentials;

pub use client_credentials::ClientCredentialsFlow;
