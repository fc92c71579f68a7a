use tokio::sync::{mpsc, oneshot};

/// The receiving side went away before taking the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

/// Sending half of a rendezvous queue.
///
/// `send` only returns once the receiver has taken the item, so at most one
/// item is ever in flight between the two ends.
#[derive(Debug)]
pub struct HandoffSender<T> {
    tx: mpsc::Sender<(T, oneshot::Sender<()>)>,
}

/// Receiving half of a rendezvous queue.
#[derive(Debug)]
pub struct HandoffReceiver<T> {
    rx: mpsc::Receiver<(T, oneshot::Sender<()>)>,
}

pub fn channel<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

impl<T> HandoffSender<T> {
    /// Wait until the receiver has accepted `item`.
    pub async fn send(&self, item: T) -> Result<(), Closed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send((item, ack_tx)).await.map_err(|_| Closed)?;
        ack_rx.await.map_err(|_| Closed)
    }
}

impl<T> HandoffReceiver<T> {
    /// Receiver already holding `item`, closed after it.
    pub fn single(item: T) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let (ack_tx, _) = oneshot::channel();
        // capacity 1, cannot be full
        let _ = tx.try_send((item, ack_tx));
        Self { rx }
    }

    /// Take the next item, releasing its sender. `None` once every sender is gone.
    ///
    /// Cancel safe: nothing is awaited after the item is taken.
    pub async fn recv(&mut self) -> Option<T> {
        let (item, ack) = self.rx.recv().await?;
        let _ = ack.send(());
        Some(item)
    }
}
