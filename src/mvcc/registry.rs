use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    mvcc::{
        conflict,
        transaction::{IsolationLevel, Transaction, TransactionId, TransactionState},
    },
};

/// Allocates transaction identities and tracks the state of every
/// transaction ever begun
///
/// Records are kept forever: the visibility predicate resolves the fate of
/// a version by looking up the state of the transaction that created or
/// deleted it, arbitrarily long after that transaction ended. The registry
/// itself is not synchronized; the engine drives it from inside one shared
/// critical section.
pub struct TransactionRegistry {
    txns: BTreeMap<TransactionId, Transaction>,
    next_id: TransactionId,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self {
            txns: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Begins a new transaction
    ///
    /// Allocates the next id, captures the set of ids still in progress as
    /// the new transaction's snapshot, and registers it as InProgress. The
    /// snapshot is captured before insertion, so it never contains the new
    /// id itself.
    pub fn begin(&mut self, level: IsolationLevel) -> TransactionId {
        let id = self.next_id;
        self.next_id += 1;

        let snapshot = self.in_progress_ids();
        debug!(
            "begin transaction {id} at {level:?} ({} in progress)",
            snapshot.len()
        );
        self.txns.insert(id, Transaction::new(id, level, snapshot));

        id
    }

    /// Returns the record for `id`, failing if the id was never issued
    pub fn lookup(&self, id: TransactionId) -> Result<&Transaction> {
        self.txns.get(&id).ok_or(Error::UnknownTransaction(id))
    }

    /// Whether the record for `id` is committed right now
    ///
    /// Unknown ids count as not committed.
    pub fn is_committed(&self, id: TransactionId) -> bool {
        self.txns
            .get(&id)
            .is_some_and(|t| t.state == TransactionState::Committed)
    }

    /// Adds `key` to the transaction's read set
    pub fn record_read(&mut self, id: TransactionId, key: &str) -> Result<()> {
        let txn = self.in_progress_mut(id)?;
        txn.read_set.insert(key.to_string());
        Ok(())
    }

    /// Adds `key` to the transaction's write set
    pub fn record_write(&mut self, id: TransactionId, key: &str) -> Result<()> {
        let txn = self.in_progress_mut(id)?;
        txn.write_set.insert(key.to_string());
        Ok(())
    }

    /// Moves an in-progress transaction to a terminal state
    ///
    /// `outcome` must be Committed or Aborted. A commit at Snapshot
    /// isolation or above runs conflict validation first; on conflict the
    /// transaction is forced to Aborted and the commit fails with
    /// `SerializationFailure`, never leaving it ambiguously in progress.
    pub fn terminate(&mut self, id: TransactionId, outcome: TransactionState) -> Result<()> {
        debug_assert!(outcome != TransactionState::InProgress);

        let txn = self.lookup(id)?;
        if !txn.is_in_progress() {
            return Err(Error::InvalidTransactionState(format!(
                "transaction {id} is already {:?}",
                txn.state
            )));
        }

        let conflict = if outcome == TransactionState::Committed
            && txn.level >= IsolationLevel::Snapshot
        {
            conflict::find_commit_conflict(self, txn)
        } else {
            None
        };

        match conflict {
            Some(found) => {
                warn!("transaction {id} aborted at commit: {found}");
                self.in_progress_mut(id)?.state = TransactionState::Aborted;
                Err(Error::SerializationFailure(found.to_string()))
            }
            None => {
                debug!("transaction {id} terminated as {outcome:?}");
                self.in_progress_mut(id)?.state = outcome;
                Ok(())
            }
        }
    }

    /// Transactions that began after `id`, in begin order
    pub(crate) fn started_after(&self, id: TransactionId) -> impl Iterator<Item = &Transaction> {
        self.txns.range(id + 1..).map(|(_, txn)| txn)
    }

    fn in_progress_ids(&self) -> BTreeSet<TransactionId> {
        self.txns
            .values()
            .filter(|txn| txn.is_in_progress())
            .map(|txn| txn.id)
            .collect()
    }

    fn in_progress_mut(&mut self, id: TransactionId) -> Result<&mut Transaction> {
        let txn = self.txns.get_mut(&id).ok_or(Error::UnknownTransaction(id))?;
        if !txn.is_in_progress() {
            return Err(Error::InvalidTransactionState(format!(
                "transaction {id} is already {:?}",
                txn.state
            )));
        }
        Ok(txn)
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
