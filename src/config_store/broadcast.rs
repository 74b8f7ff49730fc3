use futures::Stream;
use tokio::sync::mpsc::{Receiver, WeakUnboundedSender};

use super::{ConfigChange, actor::StoreCommand};

/// Capacity of each subscriber's change queue.
pub(super) const SUBSCRIPTION_CAPACITY: usize = 100;

/// A subscription handle that automatically cleans up when dropped.
///
/// Receives every `ConfigChange` whose path matches the pattern it was created
/// with. Holding a subscription does not keep the store alive; once the store
/// stops, `recv` returns `None`.
pub struct Subscription {
    id: usize,
    pattern: String,
    inbox: WeakUnboundedSender<StoreCommand>,
    receiver: Receiver<ConfigChange>,
}

impl Subscription {
    pub(super) fn new(
        id: usize,
        pattern: String,
        inbox: WeakUnboundedSender<StoreCommand>,
        receiver: Receiver<ConfigChange>,
    ) -> Self {
        Self {
            id,
            pattern,
            inbox,
            receiver,
        }
    }

    /// The pattern this subscription filters on.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Waits for the next matching change.
    pub async fn recv(&mut self) -> Option<ConfigChange> {
        self.receiver.recv().await
    }

    /// Returns a change if one is already queued.
    pub fn try_recv(&mut self) -> Option<ConfigChange> {
        self.receiver.try_recv().ok()
    }

    /// Get a mutable reference to the receiver for configuration changes.
    pub fn receiver_mut(&mut self) -> &mut Receiver<ConfigChange> {
        &mut self.receiver
    }

    /// Converts the subscription into a stream of changes.
    ///
    /// The subscription is released when the stream is dropped.
    pub fn into_stream(self) -> impl Stream<Item = ConfigChange> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|change| (change, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inbox) = self.inbox.upgrade() {
            let _ = inbox.send(StoreCommand::Unsubscribe { id: self.id });
        }
    }
}
