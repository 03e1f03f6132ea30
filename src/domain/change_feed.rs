use std::future::Future;

use futures_util::Stream;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use super::command::ChangeEvent;

/// A live view of a command collection.
///
/// Events arrive in the order the backing store publishes them, starting with
/// a snapshot of the records that existed when the subscription was opened.
/// Delivery runs through a bounded channel, so a consumer that stops polling
/// eventually stalls the pump instead of growing memory. Dropping the
/// subscription cancels it.
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    pump: JoinHandle<()>,
}

impl Subscription {
    /// Spawns `pump` with the sending half of a channel holding `capacity` events.
    /// The pump should return once `send` fails, which means the subscriber is gone.
    pub fn spawn<F, Fut>(capacity: usize, pump: F) -> Self
    where
        F: FnOnce(mpsc::Sender<ChangeEvent>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, events) = mpsc::channel(capacity.max(1));
        let pump = tokio::spawn(pump(tx));
        Self { events, pump }
    }

    /// Waits for the next change. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Returns an already-delivered change without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Stops delivery: the pump task is aborted and undelivered events are dropped.
    pub fn cancel(self) {
        self.pump.abort();
    }

    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        futures_util::stream::unfold(self, |mut sub| async move {
            let event = sub.next().await?;
            Some((event, sub))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
