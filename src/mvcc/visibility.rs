//! Decides which versions a transaction may observe.
//!
//! The predicate is pure: it never mutates anything and never allocates. All
//! isolation behavior of reads falls out of this one function; writes get
//! their guarantees from commit-time validation instead.

use crate::mvcc::{
    registry::TransactionRegistry,
    store::Version,
    transaction::{IsolationLevel, Transaction, TransactionId},
};

/// Whether `version` is visible to `reader`
///
/// Read Uncommitted observes the latest surviving version regardless of who
/// wrote it. Read Committed re-evaluates commit states on every call, so its
/// view moves as peers commit. Repeatable Read and above judge both the
/// creating and the deleting transaction against the reader's frozen
/// begin-time view.
pub(crate) fn is_visible(
    registry: &TransactionRegistry,
    reader: &Transaction,
    version: &Version,
) -> bool {
    match reader.level {
        IsolationLevel::ReadUncommitted => version.deleted_by.is_none(),
        IsolationLevel::ReadCommitted => {
            committed_or_own(registry, reader, version.created_by)
                && !version
                    .deleted_by
                    .is_some_and(|id| committed_or_own(registry, reader, id))
        }
        IsolationLevel::RepeatableRead
        | IsolationLevel::Snapshot
        | IsolationLevel::Serializable => {
            in_frozen_view(registry, reader, version.created_by)
                && !version
                    .deleted_by
                    .is_some_and(|id| in_frozen_view(registry, reader, id))
        }
    }
}

fn committed_or_own(registry: &TransactionRegistry, reader: &Transaction, id: TransactionId) -> bool {
    id == reader.id || registry.is_committed(id)
}

/// Whether `id` counts as committed in the reader's begin-time view: the
/// reader itself, or a transaction that began earlier, had already ended
/// when the reader began, and committed
///
/// A transaction absent from the snapshot with a smaller id necessarily
/// ended before the reader began, so its state can no longer change and the
/// view stays frozen.
fn in_frozen_view(registry: &TransactionRegistry, reader: &Transaction, id: TransactionId) -> bool {
    id == reader.id
        || (id < reader.id && !reader.snapshot.contains(&id) && registry.is_committed(id))
}
