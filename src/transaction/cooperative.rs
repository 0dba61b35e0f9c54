//! Asynchronous transactions.
//!
//! Entry and exit lines are written synchronously; only the enclosed future
//! suspends. A scope future dropped before its body completes logs a
//! cancellation as the exception, followed by the exit line.

use std::fmt;
use std::future::{self, Future};
use std::panic::{self, AssertUnwindSafe};
use std::pin::pin;
use std::sync::Arc;
use std::task::Poll;

use crate::identifier::{local_transaction_id, IdentifierSource, TransactionId};
use crate::log_warn;
use crate::logging::LogContext;

use super::context::{Cooperative, TransactionContext};
use super::guard::TransactionGuard;

impl TransactionContext<Cooperative> {
    /// Resolve the identifier, log entry, and return the open scope.
    ///
    /// Dropping the returned guard counts as a normal exit; use
    /// [`run`](Self::run) to have cancellation logged.
    pub async fn enter(self) -> TransactionGuard {
        let id = match self.supplied_id() {
            Some(id) => id,
            None => {
                let id = next_id(self.name(), self.id_source()).await;
                self.note_generated(&id);
                id
            }
        };
        self.open(id)
    }

    /// Run the future built by `f` inside the transaction.
    ///
    /// Each poll of the body is guarded, so a panic is logged with its
    /// message as the cause and then resumed.
    pub async fn run<T, E, F, Fut>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(TransactionId) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Debug,
    {
        let mut guard = self.enter().await;
        guard.set_in_flight(true);
        let mut body = pin!(f(guard.id().clone()));
        let polled = future::poll_fn(|cx| {
            match panic::catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(cx))) {
                Ok(Poll::Ready(outcome)) => Poll::Ready(Ok(outcome)),
                Ok(Poll::Pending) => Poll::Pending,
                Err(payload) => Poll::Ready(Err(payload)),
            }
        })
        .await;
        guard.set_in_flight(false);
        let outcome = match polled {
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

/// Sources that may block are polled on tokio's blocking pool when a runtime
/// is available, so a slow ID service does not stall other tasks.
async fn next_id(name: &str, source: Arc<dyn IdentifierSource>) -> TransactionId {
    if !source.may_block() {
        return source.next_id();
    }
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return source.next_id();
    };

    match handle.spawn_blocking(move || source.next_id()).await {
        Ok(id) => id,
        Err(e) => {
            let fallback = local_transaction_id();
            log_warn!(
                LogContext::new(name),
                "ID_FETCH_TASK_FAILED",
                error = e.to_string(),
                fallback = fallback.as_str(),
            );
            fallback
        }
    }
}
