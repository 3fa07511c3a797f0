//! Single-writer broadcast cell for [`PlaybackState`]

use tokio::sync::watch;

use super::state::PlaybackState;

/// Holds the current snapshot and hands out subscriptions.
///
/// Only the orchestrator owns a publisher; everyone else gets a
/// `watch::Receiver`, which always starts with the latest value.
pub struct StatePublisher {
    tx: watch::Sender<PlaybackState>,
}

impl StatePublisher {
    pub fn new(initial: PlaybackState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> PlaybackState {
        self.tx.borrow().clone()
    }

    /// Build the next snapshot from a copy of the current one and replace it.
    ///
    /// Subscribers are notified only when the new snapshot differs.
    pub fn update(&self, f: impl FnOnce(&mut PlaybackState)) {
        let mut next = self.current();
        f(&mut next);
        next.reconcile();
        self.tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subscriber_sees_latest_value() {
        let publisher = StatePublisher::new(PlaybackState::default());
        publisher.update(|s| s.position_ms = 10);
        let rx = publisher.subscribe();
        assert_eq!(rx.borrow().position_ms, 10);
    }

    #[tokio::test]
    async fn update_notifies_subscribers() {
        let publisher = StatePublisher::new(PlaybackState::default());
        let mut rx = publisher.subscribe();
        publisher.update(|s| s.is_playing = true);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_playing);
    }

    #[test]
    fn identical_update_is_not_broadcast() {
        let publisher = StatePublisher::new(PlaybackState::default());
        let mut rx = publisher.subscribe();
        publisher.update(|_| {});
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn update_reconciles_position() {
        let publisher = StatePublisher::new(PlaybackState::default());
        publisher.update(|s| {
            s.duration_ms = 500;
            s.position_ms = 900;
        });
        assert_eq!(publisher.current().position_ms, 500);
    }
}
