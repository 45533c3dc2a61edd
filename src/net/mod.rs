//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limit)
//!     → connection.rs (id, state machine)
//!     → Hand off to the HTTP layer (read once, respond once, close)
//!
//! Connection States:
//!     Accepted → Read → Parsed → Allowed → Fetched → Responded → Closed
//!                            ↘ Denied ──────────────↗
//!                  ↘ ParseFailed ─────────────────────────────→ Closed
//! ```
//!
//! # Design Decisions
//! - A connection permit is held for the whole exchange, so a limit of 1
//!   serves connections strictly one after another
//! - Permits and sockets are released by drop on every exit path

pub mod connection;
pub mod listener;

pub use connection::{Connection, ConnectionId, ConnectionState};
pub use listener::{ConnectionPermit, Listener, ListenerError};
