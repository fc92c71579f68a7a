use crate::dispatch::Dispatch;
use crate::handoff::HandoffReceiver;
use crate::{BoxError, Filter, Item, Record, StreamError};
use tracing::{debug, info};

/// Consumer side of a parse run.
///
/// Items arrive in the order the log wrote them; a failure, when present, is
/// always the last one. The stream is single pass, and nothing upstream reads
/// ahead of it: the parser waits at each record until it is taken here.
#[derive(Debug)]
pub struct ResultStream {
    rx: HandoffReceiver<Item>,
}

impl ResultStream {
    pub(crate) fn new(rx: HandoffReceiver<Item>) -> Self {
        Self { rx }
    }

    /// Stream that yields `err` and then ends.
    pub(crate) fn failed(err: StreamError) -> Self {
        Self {
            rx: HandoffReceiver::single(Err(err)),
        }
    }

    /// Wait for the next item; `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<Item> {
        self.rx.recv().await
    }

    /// Drain the whole stream. Any failure discards the records collected so
    /// far and is returned alone.
    pub async fn collect(mut self) -> Result<Vec<Record>, StreamError> {
        let mut records = Vec::new();
        let mut failure = None;

        // keep draining after a failure so the producer side never stays blocked
        while let Some(item) = self.next().await {
            match item {
                Ok(record) if failure.is_none() => records.push(record),
                Ok(_) => {}
                Err(err) => {
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }

        match failure {
            Some(err) => {
                debug!("Discarding {} collected files after failure", records.len());
                Err(err)
            }
            None => {
                info!("Collected {} files", records.len());
                Ok(records)
            }
        }
    }

    /// Start a dispatch by registering the first handler. See [`Dispatch`].
    pub fn on_file_do<'h, F>(self, filter: Filter, handler: F) -> Dispatch<'h>
    where
        F: FnMut(&Record) -> Result<(), BoxError> + 'h,
    {
        Dispatch::new(self).on_file_do(filter, handler)
    }
}
