//! LibLynx Core Components
//!
//! HTTP transport, cache adapter and entry point resolution.

pub mod cache;
pub mod entrypoint;
pub mod transport;

pub use cache::*;
pub use entrypoint::*;
pub use transport::*;
