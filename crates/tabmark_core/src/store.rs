//! Snapshot store shared by the tab and bookmark containers.
//!
//! A store owns one `Arc<State>` inside a `watch` channel. Each dispatch runs
//! the reducer and swaps the snapshot in a single critical section, so a
//! transition is never observed half-applied. Readers get cheap `Arc` clones
//! and never mutate them.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::StoreKind;

/// Pure transition function for one store.
pub trait Reducer {
    type State: Clone + Default + PartialEq + Send + Sync + 'static;
    type Action;

    const STORE: StoreKind;

    fn reduce(state: &Self::State, action: Self::Action) -> Self::State;

    /// Short name used in logs (payloads can be large).
    fn action_name(action: &Self::Action) -> &'static str;
}

pub struct Store<R: Reducer> {
    tx: watch::Sender<Arc<R::State>>,
}

impl<R: Reducer> Store<R> {
    pub fn new() -> Self {
        Self::with_state(R::State::default())
    }

    pub fn with_state(state: R::State) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self { tx }
    }

    /// Current committed snapshot.
    pub fn snapshot(&self) -> Arc<R::State> {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver woken after every transition that changed the state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<R::State>> {
        self.tx.subscribe()
    }

    /// Apply `action`; returns whether the snapshot changed.
    ///
    /// No-op transitions keep the previous `Arc` and do not notify subscribers.
    pub fn dispatch(&self, action: R::Action) -> bool {
        let name = R::action_name(&action);
        let changed = self.tx.send_if_modified(|current| {
            let next = R::reduce(current, action);
            if next == **current {
                false
            } else {
                *current = Arc::new(next);
                true
            }
        });
        debug!(store = %R::STORE, action = name, changed, "dispatch");
        changed
    }
}

impl<R: Reducer> Default for Store<R> {
    fn default() -> Self {
        Self::new()
    }
}
