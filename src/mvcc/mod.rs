//! Multi-version concurrency control.
//!
//! Writes never overwrite: each one appends a version stamped with the id of
//! the transaction that created it, and deletes only mark versions with the
//! id of the transaction that deleted them. What a transaction observes is
//! decided at read time by the visibility rules for its isolation level, and
//! writes are validated optimistically at commit. The id counter doubles as
//! the logical clock: a larger id always means a later start.
//!
//! The pieces, bottom up:
//!
//! - `transaction`: transaction records, isolation levels, lifecycle states
//! - `registry`: id allocation, begin-time snapshots, read/write sets
//! - `store`: version chains keyed by string, plus read/write/delete
//! - `visibility`: the pure predicate deciding who sees which version
//! - `conflict`: first-committer-wins validation at commit
//! - `engine`: the `Mvcc` handle and its transactions, behind one mutex

mod conflict;
mod engine;
mod registry;
mod store;
mod transaction;
mod visibility;

pub use engine::{Mvcc, MvccTransaction};
pub use transaction::{IsolationLevel, TransactionId, TransactionState};
