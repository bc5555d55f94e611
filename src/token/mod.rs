//! Token Management
//!
//! - **Token Storage**: persistence of the OAuth2 token in the shared cache
//! - **Authenticator**: expiry checks, refresh and grant, bearer header

pub mod manager;
pub mod storage;

pub use manager::{OAuth2Authenticator, TokenSource};
pub use storage::{TokenStore, TOKEN_KEY_PREFIX};
