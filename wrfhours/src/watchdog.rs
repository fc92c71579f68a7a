use crate::handoff::{self, HandoffReceiver, HandoffSender};
use crate::{Item, StreamError};
use std::time::Duration;
use tokio::time;
use tracing::{debug, warn};

/// Relay items from `inner` to `outer`, failing the stream with
/// [`StreamError::WatchdogTimeout`] when `inner` stays silent for longer than
/// `timeout`.
///
/// The timer only covers the wait for the next item. It is re-armed after each
/// successful forward, so a slow consumer never counts as a stalled producer.
/// Each forward waits until the consumer has taken the item.
/// `outer` is dropped (closing the public stream) when this returns.
pub async fn relay(
    timeout: Duration,
    mut inner: HandoffReceiver<Item>,
    outer: HandoffSender<Item>,
) {
    let mut forwarded = 0usize;

    loop {
        match time::timeout(timeout, inner.recv()).await {
            Ok(Some(item)) => {
                let is_failure = item.is_err();
                if outer.send(item).await.is_err() {
                    debug!("Consumer dropped the stream after {} items", forwarded);
                    return;
                }
                forwarded += 1;
                if is_failure {
                    return;
                }
            }
            Ok(None) => {
                debug!("Producer closed after {} items", forwarded);
                return;
            }
            Err(_) => {
                warn!("No new files created for more than {:?}", timeout);
                let _ = outer.send(Err(StreamError::WatchdogTimeout { timeout })).await;
                return;
            }
        }
    }
}

/// Spawn [`relay`] on the current runtime and return the public receiver.
pub fn spawn(timeout: Duration, inner: HandoffReceiver<Item>) -> HandoffReceiver<Item> {
    let (tx, rx) = handoff::channel();
    tokio::spawn(relay(timeout, inner, tx));
    rx
}
