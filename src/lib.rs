//! mvccdb - an in-memory multi-version key-value engine
//!
//! This crate provides a small transactional store with:
//! - Multi-version storage (writes append, deletes mark, nothing is erased)
//! - Five isolation levels, from Read Uncommitted to Serializable
//! - Optimistic commit validation where the first committer wins
//! - A text command session (`BEGIN`/`GET`/`SET`/`DELETE`/`COMMIT`/`ABORT`)

pub mod config;
pub mod error;
pub mod mvcc;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use mvcc::{IsolationLevel, Mvcc, MvccTransaction};
pub use session::Session;
