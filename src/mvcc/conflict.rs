use std::fmt;

use crate::mvcc::{
    registry::TransactionRegistry,
    transaction::{IsolationLevel, Transaction, TransactionId, TransactionState},
};

/// A commit-time validation failure against a committed concurrent peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Both transactions wrote the key
    WriteWrite { key: String, with: TransactionId },
    /// One transaction read the key while the other wrote it
    ReadWrite { key: String, with: TransactionId },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::WriteWrite { key, with } => {
                write!(f, "write on key {key:?} overlaps committed transaction {with}")
            }
            Conflict::ReadWrite { key, with } => {
                write!(f, "read/write on key {key:?} overlaps committed transaction {with}")
            }
        }
    }
}

/// Validates a commit at Snapshot isolation or above
///
/// A peer is concurrent with `txn` if it was in progress when `txn` began
/// (a snapshot member) or began after `txn` did. Only peers that went on to
/// commit can invalidate the commit; in-progress and aborted peers are
/// skipped, which is what makes the first committer win.
///
/// Snapshot isolation rejects overlapping write sets. Serializable also
/// rejects a read set overlapping the peer's write set and vice versa,
/// closing the write-skew anomaly.
pub(crate) fn find_commit_conflict(
    registry: &TransactionRegistry,
    txn: &Transaction,
) -> Option<Conflict> {
    let concurrent = txn
        .snapshot
        .iter()
        .filter_map(|id| registry.lookup(*id).ok())
        .chain(registry.started_after(txn.id));

    for other in concurrent {
        if other.state != TransactionState::Committed {
            continue;
        }
        if let Some(key) = txn.write_set.intersection(&other.write_set).next() {
            return Some(Conflict::WriteWrite {
                key: key.clone(),
                with: other.id,
            });
        }
        if txn.level == IsolationLevel::Serializable {
            if let Some(key) = txn.read_set.intersection(&other.write_set).next() {
                return Some(Conflict::ReadWrite {
                    key: key.clone(),
                    with: other.id,
                });
            }
            if let Some(key) = txn.write_set.intersection(&other.read_set).next() {
                return Some(Conflict::ReadWrite {
                    key: key.clone(),
                    with: other.id,
                });
            }
        }
    }

    None
}
