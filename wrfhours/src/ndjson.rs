use crate::handoff::{self, HandoffSender};
use crate::line_reader::LineReader;
use crate::{Item, Record, ResultStream, StreamError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Failure while writing records as NDJSON
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("marshal failed: error while encoding: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("marshal failed: error while writing: {0}")]
    Write(#[from] std::io::Error),
}

/// Write every record of `results` to `writer`, one JSON object per line.
///
/// Returns the number of records written, or the first failure.
pub async fn marshal<W>(mut results: ResultStream, mut writer: W) -> Result<usize, MarshalError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0usize;

    while let Some(item) = results.next().await {
        let record = item?;
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        writer.write_all(&line).await?;
        writer.flush().await?;
        written += 1;
    }

    info!("Marshalled {} files", written);
    Ok(written)
}

/// Read NDJSON records written by [`marshal`] back into a [`ResultStream`].
///
/// Blank lines are skipped. End of input closes the stream cleanly; a line
/// that is not a record ends it with [`StreamError::MalformedRecord`].
/// Must be called from within a tokio runtime.
pub fn unmarshal<R>(reader: R, timeout: Duration) -> ResultStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, inner) = handoff::channel();
    tokio::spawn(read_records(reader, tx));
    ResultStream::new(crate::watchdog::spawn(timeout, inner))
}

async fn read_records<R>(reader: R, tx: HandoffSender<Item>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = LineReader::new(reader);

    loop {
        let item = match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                serde_json::from_str::<Record>(line).map_err(|source| {
                    StreamError::MalformedRecord {
                        line: line.to_string(),
                        source,
                    }
                })
            }
            Ok(None) => {
                debug!("NDJSON input exhausted");
                return;
            }
            Err(err) => Err(StreamError::UnderlyingSourceReadFailed(err)),
        };

        let is_failure = item.is_err();
        if tx.send(item).await.is_err() || is_failure {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, stream_of};
    use crate::ErrorKind;
    use std::io::Cursor;

    fn record(hour: u32) -> Record {
        test_support::record("wrfout", 3, hour)
    }

    struct FailingWriter;

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::new(std::io::ErrorKind::Other, "TEST")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_marshal_writes_one_line_per_record() {
        let mut out = Vec::new();
        let written = marshal(stream_of(vec![Ok(record(0)), Ok(record(1))]), &mut out)
            .await
            .unwrap();

        assert_eq!(written, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"kind":"wrfout","domain":3,"instant":"2021-08-04T00:00:00Z","hour_offset":0,"filename":"wrfout_d03_2021-08-04_00:00:00"}"#
        );
    }

    #[tokio::test]
    async fn test_marshal_reports_stream_failure() {
        let mut out = Vec::new();
        let err = marshal(
            stream_of(vec![Ok(record(0)), Err(StreamError::StreamIncompleteNoSuccessMarker)]),
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MarshalError::Stream(StreamError::StreamIncompleteNoSuccessMarker)));
    }

    #[tokio::test]
    async fn test_marshal_on_failing_writer() {
        let err = marshal(stream_of(vec![Ok(record(0))]), FailingWriter)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "marshal failed: error while writing: TEST");
    }

    #[tokio::test]
    async fn test_unmarshal_reads_marshalled_records() {
        let mut out = Vec::new();
        marshal(stream_of(vec![Ok(record(0)), Ok(record(7))]), &mut out)
            .await
            .unwrap();
        out.extend_from_slice(b"\n");

        let records = unmarshal(Cursor::new(out), Duration::from_secs(1))
            .collect()
            .await
            .unwrap();

        assert_eq!(records, vec![record(0), record(7)]);
    }

    #[tokio::test]
    async fn test_unmarshal_on_wrong_json() {
        let err = unmarshal(Cursor::new(b"TEST\n".to_vec()), Duration::from_secs(1))
            .collect()
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedRecord);
        assert!(err.to_string().starts_with("malformed record `TEST`"));
    }
}
