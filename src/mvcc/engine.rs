use std::sync::{Arc, Mutex};

use crate::{
    error::Result,
    mvcc::{
        registry::TransactionRegistry,
        store::VersionStore,
        transaction::{IsolationLevel, TransactionId, TransactionState},
    },
    session::Session,
};

/// Everything the engine owns, behind one lock
struct Shared {
    registry: TransactionRegistry,
    store: VersionStore,
}

/// The multi-version storage engine
///
/// Cheap to clone; clones share the same registry and version store through
/// an `Arc<Mutex<_>>`. Each operation takes the mutex for its whole
/// duration, so individual operations serialize while transactions
/// interleave freely across calls.
#[derive(Clone)]
pub struct Mvcc {
    shared: Arc<Mutex<Shared>>,
    default_isolation: IsolationLevel,
}

impl Mvcc {
    /// Creates an empty engine defaulting to Read Committed
    pub fn new() -> Self {
        Self::with_default_isolation(IsolationLevel::default())
    }

    /// Creates an empty engine with the given default isolation level
    pub fn with_default_isolation(default_isolation: IsolationLevel) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                registry: TransactionRegistry::new(),
                store: VersionStore::new(),
            })),
            default_isolation,
        }
    }

    /// Opens a command session backed by this engine
    pub fn session(&self) -> Session {
        Session::new(self.clone())
    }

    /// Begins a transaction at the engine's default isolation level
    pub fn begin(&self) -> Result<MvccTransaction> {
        self.begin_with_isolation(self.default_isolation)
    }

    /// Begins a transaction at an explicit isolation level
    pub fn begin_with_isolation(&self, level: IsolationLevel) -> Result<MvccTransaction> {
        let mut shared = self.shared.lock()?;
        let id = shared.registry.begin(level);
        Ok(MvccTransaction {
            shared: self.shared.clone(),
            id,
            level,
        })
    }
}

impl Default for Mvcc {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to one transaction
///
/// The handle stays valid after commit or rollback, but every operation on a
/// terminated transaction fails with `InvalidTransactionState`. Dropping the
/// handle does not end the transaction: it stays in progress and its writes
/// stay invisible to everyone else, so abort is always explicit.
pub struct MvccTransaction {
    shared: Arc<Mutex<Shared>>,
    id: TransactionId,
    level: IsolationLevel,
}

impl MvccTransaction {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.level
    }

    /// Commits the transaction, making its writes durable for peers
    ///
    /// At Snapshot isolation or above this runs conflict validation; losing
    /// transactions come back as `SerializationFailure` and are aborted.
    pub fn commit(&self) -> Result<()> {
        let mut shared = self.shared.lock()?;
        shared.registry.terminate(self.id, TransactionState::Committed)
    }

    /// Aborts the transaction, discarding its writes
    pub fn rollback(&self) -> Result<()> {
        let mut shared = self.shared.lock()?;
        shared.registry.terminate(self.id, TransactionState::Aborted)
    }

    /// Reads the value of `key` as this transaction sees it
    pub fn get(&self, key: &str) -> Result<String> {
        let mut shared = self.shared.lock()?;
        let shared = &mut *shared;
        shared.store.read(&mut shared.registry, self.id, key)
    }

    /// Writes `value` under `key`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut shared = self.shared.lock()?;
        let shared = &mut *shared;
        shared
            .store
            .write(&mut shared.registry, self.id, key, value.to_string())
    }

    /// Deletes `key` as this transaction sees it
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let mut shared = self.shared.lock()?;
        let shared = &mut *shared;
        shared.store.delete(&mut shared.registry, self.id, key)
    }

    /// Current lifecycle state of this transaction
    pub fn state(&self) -> Result<TransactionState> {
        let shared = self.shared.lock()?;
        Ok(shared.registry.lookup(self.id)?.state)
    }
}

#[cfg(test)]
mod tests {
    use super::Mvcc;
    use crate::{
        error::{Error, Result},
        mvcc::transaction::{IsolationLevel, TransactionState},
    };

    #[test]
    fn test_begin_assigns_increasing_ids() -> Result<()> {
        let mvcc = Mvcc::new();
        let t1 = mvcc.begin()?;
        let t2 = mvcc.begin()?;
        assert_eq!(t1.id(), 1);
        assert_eq!(t2.id(), 2);
        assert_eq!(t1.isolation(), IsolationLevel::ReadCommitted);
        Ok(())
    }

    #[test]
    fn test_read_your_writes_at_every_level() -> Result<()> {
        for level in [
            IsolationLevel::ReadUncommitted,
            IsolationLevel::ReadCommitted,
            IsolationLevel::RepeatableRead,
            IsolationLevel::Snapshot,
            IsolationLevel::Serializable,
        ] {
            let mvcc = Mvcc::with_default_isolation(level);
            let mut txn = mvcc.begin()?;
            txn.set("k", "v")?;
            assert_eq!(txn.get("k")?, "v", "level {level:?}");
            txn.delete("k")?;
            assert!(
                matches!(txn.get("k"), Err(Error::KeyNotFound(_))),
                "level {level:?}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_read_committed_hides_dirty_writes() -> Result<()> {
        let mvcc = Mvcc::with_default_isolation(IsolationLevel::ReadCommitted);
        let mut writer = mvcc.begin()?;
        let reader = mvcc.begin()?;

        writer.set("x", "1")?;
        assert!(matches!(reader.get("x"), Err(Error::KeyNotFound(_))));

        writer.commit()?;
        assert_eq!(reader.get("x")?, "1");
        Ok(())
    }

    #[test]
    fn test_read_uncommitted_sees_dirty_writes() -> Result<()> {
        let mvcc = Mvcc::with_default_isolation(IsolationLevel::ReadUncommitted);
        let mut writer = mvcc.begin()?;
        let reader = mvcc.begin()?;

        writer.set("x", "dirty")?;
        assert_eq!(reader.get("x")?, "dirty");
        Ok(())
    }

    #[test]
    fn test_repeatable_read_view_is_frozen() -> Result<()> {
        let mvcc = Mvcc::with_default_isolation(IsolationLevel::RepeatableRead);
        let reader = mvcc.begin()?;

        let mut writer = mvcc.begin()?;
        writer.set("y", "new")?;
        writer.commit()?;

        assert!(matches!(reader.get("y"), Err(Error::KeyNotFound(_))));
        let fresh = mvcc.begin()?;
        assert_eq!(fresh.get("y")?, "new");
        Ok(())
    }

    #[test]
    fn test_repeatable_read_pins_snapshot_members() -> Result<()> {
        let mvcc = Mvcc::with_default_isolation(IsolationLevel::RepeatableRead);
        let mut writer = mvcc.begin()?;
        writer.set("x", "a")?;

        let reader = mvcc.begin()?;
        assert!(matches!(reader.get("x"), Err(Error::KeyNotFound(_))));

        // the writer was in progress when the reader began, so even its
        // commit cannot bring the value into view
        writer.commit()?;
        assert!(matches!(reader.get("x"), Err(Error::KeyNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_rollback_discards_writes() -> Result<()> {
        let mvcc = Mvcc::new();
        let mut txn = mvcc.begin()?;
        txn.set("x", "doomed")?;
        txn.rollback()?;

        let after = mvcc.begin()?;
        assert!(matches!(after.get("x"), Err(Error::KeyNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_terminated_transaction_rejects_operations() -> Result<()> {
        let mvcc = Mvcc::new();
        let mut txn = mvcc.begin()?;
        txn.commit()?;

        assert!(matches!(
            txn.get("x"),
            Err(Error::InvalidTransactionState(_))
        ));
        assert!(matches!(
            txn.set("x", "v"),
            Err(Error::InvalidTransactionState(_))
        ));
        assert!(matches!(
            txn.commit(),
            Err(Error::InvalidTransactionState(_))
        ));
        assert!(matches!(
            txn.rollback(),
            Err(Error::InvalidTransactionState(_))
        ));
        Ok(())
    }

    #[test]
    fn test_first_committer_wins() -> Result<()> {
        let mvcc = Mvcc::with_default_isolation(IsolationLevel::Snapshot);
        let mut t1 = mvcc.begin()?;
        let mut t2 = mvcc.begin()?;

        t1.set("k", "from t1")?;
        t2.set("k", "from t2")?;

        t1.commit()?;
        assert!(matches!(t2.commit(), Err(Error::SerializationFailure(_))));
        assert_eq!(t2.state()?, TransactionState::Aborted);

        let after = mvcc.begin_with_isolation(IsolationLevel::ReadCommitted)?;
        assert_eq!(after.get("k")?, "from t1");
        Ok(())
    }

    #[test]
    fn test_snapshot_allows_write_skew() -> Result<()> {
        let mvcc = Mvcc::with_default_isolation(IsolationLevel::Snapshot);
        let mut seed = mvcc.begin()?;
        seed.set("x", "1")?;
        seed.set("y", "1")?;
        seed.commit()?;

        let mut t1 = mvcc.begin()?;
        let mut t2 = mvcc.begin()?;
        t1.get("x")?;
        t1.set("y", "2")?;
        t2.get("y")?;
        t2.set("x", "2")?;

        // disjoint write sets, so snapshot isolation lets the skew through
        t1.commit()?;
        t2.commit()?;
        Ok(())
    }

    #[test]
    fn test_serializable_rejects_write_skew() -> Result<()> {
        let mvcc = Mvcc::with_default_isolation(IsolationLevel::Serializable);
        let mut seed = mvcc.begin()?;
        seed.set("x", "1")?;
        seed.set("y", "1")?;
        seed.commit()?;

        let mut t1 = mvcc.begin()?;
        let mut t2 = mvcc.begin()?;
        t1.get("x")?;
        t1.set("y", "2")?;
        t2.get("y")?;
        t2.set("x", "2")?;

        t1.commit()?;
        assert!(matches!(t2.commit(), Err(Error::SerializationFailure(_))));
        Ok(())
    }

    #[test]
    fn test_engine_shared_across_threads() -> Result<()> {
        let mvcc = Mvcc::with_default_isolation(IsolationLevel::ReadCommitted);

        let mut handles = Vec::new();
        for i in 0..4 {
            let engine = mvcc.clone();
            handles.push(std::thread::spawn(move || -> Result<()> {
                let mut txn = engine.begin()?;
                txn.set(&format!("k{i}"), "v")?;
                txn.commit()
            }));
        }
        for handle in handles {
            handle
                .join()
                .map_err(|_| Error::Internal("worker panicked".to_string()))??;
        }

        let txn = mvcc.begin()?;
        for i in 0..4 {
            assert_eq!(txn.get(&format!("k{i}"))?, "v");
        }
        Ok(())
    }
}
