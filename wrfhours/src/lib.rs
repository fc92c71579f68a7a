// Streaming extraction of output-file records from WRF logs.
//
// source -> StreamParser task -> watchdog task -> ResultStream (caller)

pub mod types;
pub mod options;
pub mod handoff;
pub mod line_reader;
pub mod classifier;
pub mod decoder;
pub mod stream_parser;
pub mod watchdog;
pub mod results;
pub mod dispatch;
pub mod ndjson;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use types::*;
pub use options::{CompletionHook, ParseOptions, DEFAULT_TIMEOUT};
pub use stream_parser::{ParserState, StreamParser};
pub use results::ResultStream;
pub use dispatch::Dispatch;

use std::path::Path;
use tokio::io::AsyncRead;
use tracing::{error, info};

/// Parse a WRF log read from `reader`.
///
/// The parser and the watchdog run as tasks on the current tokio runtime, so
/// this must be called from within one. Records become available on the
/// returned stream while the log is still being written.
pub fn parse<R>(reader: R, options: ParseOptions) -> ResultStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let ParseOptions { timeout, on_complete } = options;

    let (tx, inner) = handoff::channel();
    tokio::spawn(StreamParser::new().run(reader, tx, on_complete));

    ResultStream::new(watchdog::spawn(timeout, inner))
}

/// Parse the WRF log at `path`, usually `rsl.out.0000`.
///
/// A file that cannot be opened is reported as the only item of the
/// returned stream. The file is closed when parsing ends.
pub async fn parse_file(path: impl AsRef<Path>, options: ParseOptions) -> ResultStream {
    let path = path.as_ref();
    info!("Opening WRF log {}", path.display());

    match tokio::fs::File::open(path).await {
        Ok(file) => parse(file, options),
        Err(err) => {
            error!("Failed to open {}: {}", path.display(), err);
            ResultStream::failed(StreamError::UnderlyingSourceReadFailed(err))
        }
    }
}
