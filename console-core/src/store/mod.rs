//! Explicit state containers. One store per bounded context is built at
//! start-up and handed to whoever renders it; subscribers are notified on
//! every update.

mod collection;

pub use collection::{CollectionState, CollectionStore, ListQuery, Resource};

use tokio::sync::watch;

/// A single state value with `update`/`subscribe`.
///
/// Only the owning context mutates the state. Readers take a snapshot or
/// subscribe to a `watch` receiver that always holds the latest version.
#[derive(Debug)]
pub struct Store<S> {
    tx: watch::Sender<S>,
}

impl<S: Clone> Store<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Read a projection without cloning the whole state.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Apply `f` and notify subscribers, even when nobody is subscribed yet.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

impl<S: Clone + Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        value: u32,
    }

    #[test]
    fn update_without_subscribers_still_applies() {
        let store = Store::new(Counter::default());
        store.update(|s| s.value += 2);
        assert_eq!(store.snapshot(), Counter { value: 2 });
        assert_eq!(store.read(|s| s.value), 2);
    }

    #[tokio::test]
    async fn subscribers_see_every_update() {
        let store: Store<Counter> = Store::default();
        let mut rx = store.subscribe();

        store.update(|s| s.value = 7);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().value, 7);
    }
}
