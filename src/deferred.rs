//! One-shot, externally settleable result cell.
//!
//! The settling half is cheaply cloneable so every party that may decide the
//! outcome (event dispatch, per-job handlers) can hold one. The first call to
//! [`Deferred::resolve`] or [`Deferred::reject`] wins; every later settlement
//! attempt is a no-op.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

/// Create a connected settler/awaiter pair.
pub fn deferred<T, E>() -> (Deferred<T, E>, Settled<T, E>) {
    let (tx, rx) = oneshot::channel();
    (
        Deferred {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        Settled { rx },
    )
}

/// The settling half. Single-assignment: only the first settlement counts.
pub struct Deferred<T, E> {
    tx: Arc<Mutex<Option<oneshot::Sender<Result<T, E>>>>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T, E> Deferred<T, E> {
    pub fn resolve(&self, value: T) {
        self.settle(Ok(value));
    }

    pub fn reject(&self, err: E) {
        self.settle(Err(err));
    }

    fn settle(&self, outcome: Result<T, E>) {
        let sender = self.tx.lock().expect("deferred lock poisoned").take();
        if let Some(tx) = sender {
            // The awaiter may be gone (e.g. the run was already cancelled);
            // a lost settlement is fine.
            let _ = tx.send(outcome);
        }
    }
}

/// The awaiting half.
pub struct Settled<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Settled<T, E> {
    /// Wait until the cell settles. Returns `None` if every settler was
    /// dropped without deciding an outcome.
    pub async fn wait(self) -> Option<Result<T, E>> {
        self.rx.await.ok()
    }
}
