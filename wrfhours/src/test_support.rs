use crate::{handoff, Item, Record, ResultStream};
use chrono::{TimeZone, Utc};

/// Record of `kind` on `domain`, written `hour` hours after a 2021-08-04 start.
pub(crate) fn record(kind: &str, domain: u32, hour: u32) -> Record {
    Record {
        kind: kind.to_string(),
        domain,
        instant: Utc.with_ymd_and_hms(2021, 8, 4, hour, 0, 0).unwrap(),
        hour_offset: i64::from(hour),
        filename: format!("{}_d{:02}_2021-08-04_{:02}:00:00", kind, domain, hour),
    }
}

/// Stream fed by a task sending `items` in order.
pub(crate) fn stream_of(items: Vec<Item>) -> ResultStream {
    let (tx, rx) = handoff::channel();
    tokio::spawn(async move {
        for item in items {
            if tx.send(item).await.is_err() {
                return;
            }
        }
    });
    ResultStream::new(rx)
}
