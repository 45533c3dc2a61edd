//! News content server library.
//!
//! Serves paginated slices of pipe-delimited news datasets as JSON over a
//! minimal line-based request protocol.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod store;

pub use config::ServerConfig;
pub use http::ContentServer;
pub use lifecycle::Shutdown;
pub use store::{Record, RecordStore};
