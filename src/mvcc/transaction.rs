use std::collections::BTreeSet;

/// Transaction identifier
///
/// Unique and strictly increasing; the order of ids is the order in which
/// transactions began.
pub type TransactionId = u64;

/// Transaction isolation levels, weakest first
///
/// The derived ordering follows declaration order, so `level >= Snapshot`
/// selects the levels that require commit-time validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum IsolationLevel {
    /// Sees every live version, even uncommitted ones
    ReadUncommitted,
    /// Sees whatever is committed at the moment of each read
    #[default]
    ReadCommitted,
    /// Sees one fixed view: whatever was committed when the transaction began
    RepeatableRead,
    /// Repeatable read plus write-write conflict detection at commit
    Snapshot,
    /// Snapshot plus read-write conflict detection at commit
    Serializable,
}

/// Transaction lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    InProgress,
    Committed,
    Aborted,
}

/// A transaction as tracked by the registry
///
/// Created by begin and kept forever: later transactions consult the state
/// of earlier ones to decide visibility, so records are never removed. Only
/// the read/write sets (while in progress) and the single terminal state
/// transition mutate a record after creation.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub level: IsolationLevel,
    pub state: TransactionState,
    /// Ids that were in progress when this transaction began; fixed at
    /// begin time and never contains the transaction's own id
    pub snapshot: BTreeSet<TransactionId>,
    /// Keys read so far, kept for serializable validation
    pub read_set: BTreeSet<String>,
    /// Keys written or deleted so far, kept for first-committer-wins
    pub write_set: BTreeSet<String>,
}

impl Transaction {
    pub(crate) fn new(
        id: TransactionId,
        level: IsolationLevel,
        snapshot: BTreeSet<TransactionId>,
    ) -> Self {
        Self {
            id,
            level,
            state: TransactionState::InProgress,
            snapshot,
            read_set: BTreeSet::new(),
            write_set: BTreeSet::new(),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.state == TransactionState::InProgress
    }
}
