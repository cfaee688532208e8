use log::debug;

use crate::{
    error::{Error, Result},
    mvcc::{Mvcc, MvccTransaction},
};

/// A text-command front end over the engine
///
/// Each session owns at most one open transaction; `BEGIN` opens it and
/// `COMMIT`/`ABORT` close it. Concurrent clients get one session each, all
/// sharing the engine underneath.
pub struct Session {
    engine: Mvcc,
    txn: Option<MvccTransaction>,
}

impl Session {
    pub fn new(engine: Mvcc) -> Self {
        Self { engine, txn: None }
    }

    /// Executes one command line, returning its output
    ///
    /// Verbs are case-insensitive and arity is strict:
    ///
    /// ```text
    /// BEGIN            -> the new transaction id
    /// COMMIT           -> ""
    /// ABORT            -> ""
    /// GET key          -> the value
    /// SET key value    -> ""
    /// DELETE key       -> ""
    /// ```
    ///
    /// Engine errors propagate unchanged; anything unrecognized is a
    /// `Parse` error.
    pub fn execute(&mut self, input: &str) -> Result<String> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let Some((verb, args)) = tokens.split_first() else {
            return Err(Error::Parse("empty command".to_string()));
        };

        let verb = verb.to_ascii_uppercase();
        debug!("session command {verb} with {} args", args.len());

        match (verb.as_str(), args) {
            ("BEGIN", []) => self.begin(),
            ("COMMIT", []) => self.commit(),
            ("ABORT", []) => self.abort(),
            ("GET", [key]) => self.open_txn()?.get(key),
            ("SET", [key, value]) => {
                self.open_txn()?.set(key, value)?;
                Ok(String::new())
            }
            ("DELETE", [key]) => {
                self.open_txn()?.delete(key)?;
                Ok(String::new())
            }
            _ => Err(Error::Parse(format!(
                "malformed command: {}",
                input.trim()
            ))),
        }
    }

    fn begin(&mut self) -> Result<String> {
        if self.txn.is_some() {
            return Err(Error::InvalidTransactionState(
                "a transaction is already open".to_string(),
            ));
        }
        let txn = self.engine.begin()?;
        let id = txn.id();
        self.txn = Some(txn);
        Ok(id.to_string())
    }

    fn commit(&mut self) -> Result<String> {
        // drop the handle first: a commit that fails validation has already
        // aborted the transaction, so the session must forget it either way
        let txn = self.txn.take().ok_or_else(no_open_transaction)?;
        txn.commit()?;
        Ok(String::new())
    }

    fn abort(&mut self) -> Result<String> {
        let txn = self.txn.take().ok_or_else(no_open_transaction)?;
        txn.rollback()?;
        Ok(String::new())
    }

    fn open_txn(&mut self) -> Result<&mut MvccTransaction> {
        self.txn.as_mut().ok_or_else(no_open_transaction)
    }
}

fn no_open_transaction() -> Error {
    Error::InvalidTransactionState("no open transaction".to_string())
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{Error, Result},
        mvcc::{IsolationLevel, Mvcc},
    };

    #[test]
    fn test_command_flow() -> Result<()> {
        let engine = Mvcc::new();
        let mut session = engine.session();

        assert_eq!(session.execute("BEGIN")?, "1");
        assert_eq!(session.execute("SET a 1")?, "");
        assert_eq!(session.execute("GET a")?, "1");
        assert_eq!(session.execute("COMMIT")?, "");

        assert_eq!(session.execute("BEGIN")?, "2");
        assert_eq!(session.execute("DELETE a")?, "");
        assert!(matches!(
            session.execute("GET a"),
            Err(Error::KeyNotFound(_))
        ));
        assert_eq!(session.execute("ABORT")?, "");

        // the abort discarded the delete
        assert_eq!(session.execute("BEGIN")?, "3");
        assert_eq!(session.execute("GET a")?, "1");
        Ok(())
    }

    #[test]
    fn test_verbs_are_case_insensitive() -> Result<()> {
        let mut session = Mvcc::new().session();
        session.execute("begin")?;
        session.execute("set k v")?;
        assert_eq!(session.execute("Get k")?, "v");
        session.execute("commit")?;
        Ok(())
    }

    #[test]
    fn test_malformed_commands() -> Result<()> {
        let mut session = Mvcc::new().session();
        session.execute("BEGIN")?;

        for input in ["", "  ", "GET", "GET a b", "SET k", "COMMIT now", "FROB k"] {
            assert!(
                matches!(session.execute(input), Err(Error::Parse(_))),
                "input {input:?} should not parse"
            );
        }
        Ok(())
    }

    #[test]
    fn test_begin_twice() -> Result<()> {
        let mut session = Mvcc::new().session();
        session.execute("BEGIN")?;
        assert!(matches!(
            session.execute("BEGIN"),
            Err(Error::InvalidTransactionState(_))
        ));
        Ok(())
    }

    #[test]
    fn test_commands_require_open_transaction() {
        let mut session = Mvcc::new().session();
        for input in ["GET k", "SET k v", "DELETE k", "COMMIT", "ABORT"] {
            assert!(
                matches!(
                    session.execute(input),
                    Err(Error::InvalidTransactionState(_))
                ),
                "input {input:?} should require a transaction"
            );
        }
    }

    #[test]
    fn test_failed_commit_clears_the_transaction() -> Result<()> {
        let engine = Mvcc::with_default_isolation(IsolationLevel::Snapshot);
        let mut alice = engine.session();
        let mut bob = engine.session();

        alice.execute("BEGIN")?;
        bob.execute("BEGIN")?;
        alice.execute("SET k from-alice")?;
        bob.execute("SET k from-bob")?;

        alice.execute("COMMIT")?;
        assert!(matches!(
            bob.execute("COMMIT"),
            Err(Error::SerializationFailure(_))
        ));

        // the session let go of the aborted transaction, so BEGIN works
        assert_eq!(bob.execute("BEGIN")?, "3");
        assert_eq!(bob.execute("GET k")?, "from-alice");
        Ok(())
    }
}
