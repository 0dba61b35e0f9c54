//! Synchronous transactions.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::identifier::TransactionId;

use super::context::{Blocking, TransactionContext};
use super::guard::TransactionGuard;

impl TransactionContext<Blocking> {
    /// Resolve the identifier, log entry, and return the open scope.
    pub fn enter(self) -> TransactionGuard {
        let id = match self.supplied_id() {
            Some(id) => id,
            None => {
                let id = self.id_source().next_id();
                self.note_generated(&id);
                id
            }
        };
        self.open(id)
    }

    /// Run `f` inside the transaction.
    ///
    /// An `Err` is logged as an exception with its `Debug` rendering as the
    /// cause, then returned unchanged after the exit line. A panic is logged
    /// with its message as the cause and then resumed.
    pub fn run<T, E, F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&TransactionId) -> Result<T, E>,
        E: fmt::Debug,
    {
        let mut guard = self.enter();
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| f(guard.id()))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                guard.fail_panicked(payload.as_ref());
                drop(guard);
                panic::resume_unwind(payload);
            }
        };
        if let Err(e) = &outcome {
            guard.fail(e);
        }
        drop(guard);
        outcome
    }
}
