//! Cancellable stream of result batches.
//!
//! A [`Subscription`] pairs the consumer end of a bounded channel with a
//! [`SubscriptionHandle`]. The producer holds the matching
//! [`SubscriptionSink`] and stops as soon as the handle is released or the
//! consumer drops its end.
//!
//! The handle is released exactly once: [`SubscriptionHandle::cancel`]
//! consumes it, and dropping it without cancelling releases it on every other
//! exit path.

use std::future::Future;

use tokio::sync::{mpsc, oneshot};

/// Default number of batches buffered between producer and consumer.
pub const SUBSCRIPTION_BUFFER: usize = 8;

/// Release guard for a running subscription.
#[derive(Debug)]
pub struct SubscriptionHandle {
    stop: Option<oneshot::Sender<()>>,
}

impl SubscriptionHandle {
    /// Handle with nothing behind it, for subscriptions that never started
    /// a producer.
    pub fn detached() -> Self {
        Self { stop: None }
    }

    /// Whether a producer is still attached to this handle.
    pub fn is_active(&self) -> bool {
        self.stop.as_ref().is_some_and(|stop| !stop.is_closed())
    }

    /// Stop the producer.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The producer may already be gone; that is a completed release.
            let _ = stop.send(());
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Consumer end of a subscription.
#[derive(Debug)]
pub struct Subscription<T> {
    batches: mpsc::Receiver<T>,
    handle: SubscriptionHandle,
}

impl<T> Subscription<T> {
    /// Open a subscription with the given buffer, returning the consumer and
    /// producer ends.
    pub fn channel(buffer: usize) -> (Self, SubscriptionSink<T>) {
        let (tx, batches) = mpsc::channel(buffer.max(1));
        let (stop_tx, stop) = oneshot::channel();
        (
            Self {
                batches,
                handle: SubscriptionHandle { stop: Some(stop_tx) },
            },
            SubscriptionSink {
                tx,
                stop,
                released: false,
            },
        )
    }

    /// Subscription that yields `items` then ends, with no producer attached.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let items: Vec<T> = items.into_iter().collect();
        let (tx, batches) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity covers every item, so this cannot fail.
            let _ = tx.try_send(item);
        }
        Self {
            batches,
            handle: SubscriptionHandle::detached(),
        }
    }

    /// Next batch, or `None` once the producer has stopped.
    pub async fn next(&mut self) -> Option<T> {
        self.batches.recv().await
    }

    /// Release the producer and discard buffered batches.
    pub fn cancel(self) {
        let Self { batches, handle } = self;
        handle.cancel();
        drop(batches);
    }

    /// Split into the batch receiver and the release handle.
    pub fn into_parts(self) -> (mpsc::Receiver<T>, SubscriptionHandle) {
        (self.batches, self.handle)
    }
}

/// Producer end of a subscription.
#[derive(Debug)]
pub struct SubscriptionSink<T> {
    tx: mpsc::Sender<T>,
    stop: oneshot::Receiver<()>,
    released: bool,
}

impl<T> SubscriptionSink<T> {
    /// Deliver one batch. Returns `false` once the subscription is released
    /// or the consumer is gone; the producer should then stop.
    pub async fn send(&mut self, batch: T) -> bool {
        if self.released {
            return false;
        }
        tokio::select! {
            biased;
            _ = &mut self.stop => {
                self.released = true;
                false
            }
            sent = self.tx.send(batch) => {
                self.released = sent.is_err();
                !self.released
            }
        }
    }

    /// Await `fut` unless the subscription is released first.
    pub async fn until_released<F>(&mut self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        if self.released {
            return None;
        }
        tokio::select! {
            biased;
            _ = &mut self.stop => {
                self.released = true;
                None
            }
            _ = self.tx.closed() => {
                self.released = true;
                None
            }
            output = fut => Some(output),
        }
    }

    /// Whether the consumer released the subscription.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn batches_arrive_in_send_order() {
        let (mut subscription, mut sink) = Subscription::channel(4);
        assert!(sink.send(1).await);
        assert!(sink.send(2).await);
        drop(sink);

        assert_eq!(subscription.next().await, Some(1));
        assert_eq!(subscription.next().await, Some(2));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn cancel_stops_the_producer() {
        let (subscription, mut sink) = Subscription::<u8>::channel(1);
        subscription.cancel();

        assert!(!sink.send(1).await);
        assert!(sink.is_released());
    }

    #[tokio::test]
    async fn dropping_the_handle_releases_it() {
        let (subscription, mut sink) = Subscription::<u8>::channel(1);
        let (_batches, handle) = subscription.into_parts();
        assert!(handle.is_active());
        drop(handle);

        let waited = sink.until_released(std::future::pending::<()>()).await;
        assert!(waited.is_none());
    }

    #[tokio::test]
    async fn until_released_returns_output_while_active() {
        let (_subscription, mut sink) = Subscription::<u8>::channel(1);
        let output = sink
            .until_released(tokio::time::sleep(Duration::from_millis(1)))
            .await;
        assert!(output.is_some());
    }

    #[tokio::test]
    async fn from_items_yields_then_ends() {
        let mut subscription = Subscription::from_items([Vec::<u8>::new()]);
        assert_eq!(subscription.next().await, Some(Vec::new()));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn detached_handles_report_inactive() {
        let handle = SubscriptionHandle::detached();
        assert!(!handle.is_active());
        handle.cancel();
    }
}
