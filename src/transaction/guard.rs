//! Guard form of an open transaction.

use std::any::Any;
use std::fmt;

use crate::identifier::TransactionId;
use crate::marker::Marker;

use super::scope::{Interrupted, Scope};

/// An entered transaction. Dropping it logs the exit line.
///
/// Call [`TransactionGuard::fail`] before dropping to record an exceptional
/// exit. A guard dropped during a panic records the panic on its own.
pub struct TransactionGuard {
    scope: Scope,
}

impl TransactionGuard {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }

    pub fn id(&self) -> &TransactionId {
        self.scope.id()
    }

    pub fn marker(&self) -> Marker {
        self.scope.marker()
    }

    pub fn name(&self) -> &str {
        self.scope.name()
    }

    pub fn fail(&mut self, cause: &dyn fmt::Debug) {
        self.scope.fail(cause);
    }

    /// Record a caught panic, with its message as the cause.
    pub(crate) fn fail_panicked(&mut self, payload: &(dyn Any + Send)) {
        self.scope.fail(&Interrupted::from_panic(payload));
    }

    pub(crate) fn set_in_flight(&mut self, in_flight: bool) {
        self.scope.set_in_flight(in_flight);
    }
}

impl fmt::Debug for TransactionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionGuard")
            .field("name", &self.name())
            .field("id", self.id())
            .field("marker", &self.marker())
            .finish()
    }
}
