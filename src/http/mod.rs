//! Request/response protocol subsystem.
//!
//! # Data Flow
//! ```text
//! raw bytes from one connection
//!     → request.rs (tokenize request line, headers, pagination window)
//!     → policy.rs (is the method the retrieval verb?)
//!     → [record store fetch]
//!     → response.rs (status line, headers, JSON or text body)
//!     → server.rs writes the envelope and closes the connection
//! ```

pub mod policy;
pub mod request;
pub mod response;
pub mod server;

pub use policy::{Access, AccessPolicy, ReadOnlyPolicy, ALLOWED_METHOD};
pub use request::{parse_request, Page, ParseError, ParsedRequest, ValidationError};
pub use response::{ResponseEnvelope, Status};
pub use server::{ContentServer, RequestHandler, TransportError};
