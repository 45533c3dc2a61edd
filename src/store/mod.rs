//! Record store subsystem.
//!
//! # Data Flow
//! ```text
//! category (decoded request path)
//!     → record_store.rs (resolve `<data_dir>/<category>.<ext>`, read file)
//!     → reader.rs (line-oriented, pipe-delimited rows → Record)
//!     → window [start, start + count) clipped to available rows
//!     → Vec<Record> handed to the response builder
//! ```
//!
//! # Design Decisions
//! - Read-only: every fetch re-reads its file, nothing is cached or shared
//! - Malformed rows are skipped and counted, never fatal
//! - Categories that look like path components are rejected before any I/O

pub mod reader;
pub mod record;
pub mod record_store;

pub use reader::{DatasetReader, MalformedRow, DATASET_HEADER};
pub use record::Record;
pub use record_store::{RecordStore, StoreError};
