//! # Host Bridge Traits
//!
//! The capabilities the editor core needs from its host, expressed as traits
//! so the audio cache can be driven by a desktop shell or by test doubles.
//!
//! ## Traits
//!
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Well-known directories and free-space queries
//! - [`LogSink`](log::LogSink) - Mirror structured logs into the host
//!
//! | Host     | Crate            |
//! |----------|------------------|
//! | Desktop  | `bridge-desktop` |
//!
//! ## Errors
//!
//! Every bridge call returns [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it and name the path involved in the message.
//!
//! All traits are `Send + Sync`: one implementation is shared between the UI
//! thread and the cache worker threads.
//!
//! ## Testing
//!
//! Enable the `mock` feature to get `mockall` doubles such as
//! `storage::MockFileSystemAccess` in downstream test suites.

pub mod error;
pub mod log;
pub mod storage;

pub use error::BridgeError;

pub use log::{LogEntry, LogLevel, LogSink, StderrSink};
pub use storage::FileSystemAccess;
