use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    mvcc::{registry::TransactionRegistry, transaction::TransactionId, visibility::is_visible},
};

/// One immutable revision of a key's payload
///
/// `created_by` is the transaction that wrote it. `deleted_by` starts empty
/// and is set by the transaction that superseded or deleted the revision; it
/// may be set again if that transaction aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub created_by: TransactionId,
    pub deleted_by: Option<TransactionId>,
    pub value: String,
}

/// Every version ever written for one key, oldest first
///
/// Chains only grow. A write appends; a delete or overwrite marks
/// `deleted_by` on the versions it shadows. Nothing is ever removed.
pub type VersionChain = Vec<Version>;

/// The versioned key space
///
/// Reads and writes resolve against the caller's transaction through the
/// registry, so the store itself has no notion of "current" values, only of
/// which versions exist and who created or deleted them.
pub struct VersionStore {
    chains: BTreeMap<String, VersionChain>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self {
            chains: BTreeMap::new(),
        }
    }

    /// Reads the newest version of `key` visible to the transaction
    ///
    /// The key lands in the read set before the chain is scanned, so even a
    /// read that finds nothing participates in serializable validation.
    pub fn read(
        &self,
        registry: &mut TransactionRegistry,
        id: TransactionId,
        key: &str,
    ) -> Result<String> {
        registry.record_read(id, key)?;
        let reader = registry.lookup(id)?;

        if let Some(chain) = self.chains.get(key) {
            // newest first, so later writes shadow earlier ones
            for version in chain.iter().rev() {
                if is_visible(registry, reader, version) {
                    return Ok(version.value.clone());
                }
            }
        }
        Err(Error::KeyNotFound(key.to_string()))
    }

    /// Writes a new version of `key`
    ///
    /// Every version currently visible to the writer is marked deleted by
    /// it, then the new version is appended. Overwriting a key twice in one
    /// transaction therefore leaves only the latest version alive.
    pub fn write(
        &mut self,
        registry: &mut TransactionRegistry,
        id: TransactionId,
        key: &str,
        value: String,
    ) -> Result<()> {
        registry.record_write(id, key)?;
        let writer = registry.lookup(id)?;

        let chain = self.chains.entry(key.to_string()).or_default();
        for version in chain.iter_mut() {
            if is_visible(registry, writer, version) {
                version.deleted_by = Some(id);
            }
        }
        chain.push(Version {
            created_by: id,
            deleted_by: None,
            value,
        });
        Ok(())
    }

    /// Deletes `key` by marking its visible versions
    ///
    /// The key lands in the write set before the chain is scanned; a delete
    /// that finds no visible version fails with `KeyNotFound` but still
    /// counts as a write intent. Marking overwrites a `deleted_by` left
    /// behind by an aborted transaction, which resurrects nothing and lets
    /// the key be deleted again.
    pub fn delete(
        &mut self,
        registry: &mut TransactionRegistry,
        id: TransactionId,
        key: &str,
    ) -> Result<()> {
        registry.record_write(id, key)?;
        let writer = registry.lookup(id)?;

        let mut found = false;
        if let Some(chain) = self.chains.get_mut(key) {
            for version in chain.iter_mut() {
                if is_visible(registry, writer, version) {
                    version.deleted_by = Some(id);
                    found = true;
                }
            }
        }
        if found {
            Ok(())
        } else {
            Err(Error::KeyNotFound(key.to_string()))
        }
    }
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}
