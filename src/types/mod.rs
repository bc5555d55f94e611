//! LibLynx Types
//!
//! Data types shared across the client: configuration, tokens, HAL links and
//! the identification request payload.

pub mod config;
pub mod hal;
pub mod request;
pub mod token;

pub use config::*;
pub use hal::*;
pub use request::*;
pub use token::*;
