use crate::{BoxError, DispatchError, Filter, Record, ResultStream};
use tracing::{debug, info, warn};

type Handler<'h> = Box<dyn FnMut(&Record) -> Result<(), BoxError> + 'h>;

struct Registration<'h> {
    filter: Filter,
    handler: Handler<'h>,
}

/// Filtered dispatch over a [`ResultStream`].
///
/// Handlers run in registration order, and every matching handler sees a
/// record before the next record is read.
///
/// ```rust,ignore
/// let mut d03 = Vec::new();
/// results
///     .on_file_do(Filter::new("wrfout", 3), |file| {
///         d03.push(file.clone());
///         Ok(())
///     })
///     .on_file_do(Filter::all(), |file| notify(file))
///     .execute()
///     .await?;
/// ```
pub struct Dispatch<'h> {
    results: ResultStream,
    registrations: Vec<Registration<'h>>,
}

impl<'h> Dispatch<'h> {
    pub fn new(results: ResultStream) -> Self {
        Self {
            results,
            registrations: Vec::new(),
        }
    }

    /// Register a handler for records passing `filter`
    pub fn on_file_do<F>(mut self, filter: Filter, handler: F) -> Self
    where
        F: FnMut(&Record) -> Result<(), BoxError> + 'h,
    {
        debug!("Registering file handler for {:?}", filter);
        self.registrations.push(Registration {
            filter,
            handler: Box::new(handler),
        });
        self
    }

    /// Consume the stream, calling every matching handler for each record.
    ///
    /// Stops at the first stream failure or handler failure. Returning early
    /// drops the stream, which stops the parser at its next handoff.
    pub async fn execute(mut self) -> Result<(), DispatchError> {
        info!("Dispatching files to {} handlers", self.registrations.len());
        let mut dispatched = 0usize;

        while let Some(item) = self.results.next().await {
            let record = item?;

            for registration in self
                .registrations
                .iter_mut()
                .filter(|r| r.filter.matches(&record))
            {
                if let Err(err) = (registration.handler)(&record) {
                    warn!("Handler failed on {}: {}", record.filename, err);
                    return Err(DispatchError::HandlerFailed(err));
                }
            }
            dispatched += 1;
        }

        info!("Dispatch complete: {} files", dispatched);
        Ok(())
    }
}
