use crate::classifier::{classify, LineKind};
use crate::decoder::{decode_start_line, decode_timing_line};
use crate::handoff::HandoffSender;
use crate::line_reader::LineReader;
use crate::options::CompletionHook;
use crate::{Item, Record, StreamError};
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};

/// Where the parser is in the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingStart,
    Streaming,
    Completed,
    Failed,
}

/// What a single line produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to emit, keep reading
    Continue,
    Emit(Record),
    /// The success marker was found
    Complete,
}

/// Line-driven state machine turning a WRF log into records.
#[derive(Debug)]
pub struct StreamParser {
    state: ParserState,
    start: Option<DateTime<Utc>>,
    lines_read: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitingStart,
            start: None,
            lines_read: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Run start instant, once the start line has been seen.
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// Feed one line. Any error moves the parser to `Failed`.
    pub fn feed_line(&mut self, line: &str) -> Result<Step, StreamError> {
        if self.is_terminal() {
            return Ok(Step::Continue);
        }
        self.lines_read += 1;

        let result = match classify(line, self.start.is_some()) {
            LineKind::StartInstant => decode_start_line(line)
                .map(|instant| {
                    debug!("Run start instant: {}", instant);
                    self.start = Some(instant);
                    self.state = ParserState::Streaming;
                    Step::Continue
                })
                .map_err(|source| StreamError::StartLine {
                    line: line.to_string(),
                    source,
                }),
            LineKind::Timing => decode_timing_line(line, self.start)
                .map(|decoded| match decoded {
                    Some(record) => Step::Emit(record),
                    None => {
                        debug!("Skipping restart file at line {}", self.lines_read);
                        Step::Continue
                    }
                })
                .map_err(|source| StreamError::TimingLine {
                    line: line.to_string(),
                    source,
                }),
            LineKind::Completion => {
                self.state = ParserState::Completed;
                Ok(Step::Complete)
            }
            LineKind::Other => Ok(Step::Continue),
        };

        if result.is_err() {
            self.state = ParserState::Failed;
        }
        result
    }

    /// Mark the input as exhausted. Running out of lines is always a failure
    /// unless the success marker was seen first.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        match self.state {
            ParserState::Completed => Ok(()),
            _ => {
                self.state = ParserState::Failed;
                Err(StreamError::StreamIncompleteNoSuccessMarker)
            }
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self.state, ParserState::Completed | ParserState::Failed)
    }

    /// Read `reader` line by line. Every record must be taken from `tx` before
    /// the next line is read. The channel is closed when the run ends; a
    /// failure, if any, is the last item sent.
    pub async fn run<R>(
        mut self,
        reader: R,
        tx: HandoffSender<Item>,
        on_complete: CompletionHook,
    ) where
        R: AsyncRead + Unpin,
    {
        info!("Starting WRF log parsing");
        let mut lines = LineReader::new(reader);
        let mut emitted = 0usize;

        let outcome = loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break self.finish(),
                Err(err) => {
                    self.state = ParserState::Failed;
                    break Err(StreamError::UnderlyingSourceReadFailed(err));
                }
            };

            match self.feed_line(&line) {
                Ok(Step::Continue) => {}
                Ok(Step::Emit(record)) => {
                    debug!("Parsed file {} (hour {})", record.filename, record.hour_offset);
                    if tx.send(Ok(record)).await.is_err() {
                        debug!("Record receiver dropped, stopping parser");
                        // nobody is listening for a failure either
                        drop(lines);
                        if let Err(err) = on_complete() {
                            warn!("Completion hook failed after consumer left: {}", err);
                        }
                        return;
                    }
                    emitted += 1;
                }
                Ok(Step::Complete) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        // release the source before the hook runs
        drop(lines);
        let failure = close_run(outcome, on_complete);

        match failure {
            None => info!("WRF log parsing complete: {} files", emitted),
            Some(err) => {
                error!("WRF log parsing failed after {} files: {}", emitted, err);
                let _ = tx.send(Err(err)).await;
            }
        }
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the completion hook once and pick the terminal failure.
/// A failure that happened before the hook always wins over the hook's own.
fn close_run(outcome: Result<(), StreamError>, on_complete: CompletionHook) -> Option<StreamError> {
    let hook_result = on_complete();

    match (outcome, hook_result) {
        (Ok(()), Ok(())) => None,
        (Ok(()), Err(err)) => Some(StreamError::CompletionHookFailed(err)),
        (Err(err), Ok(())) => Some(err),
        (Err(err), Err(hook_err)) => {
            warn!("Completion hook failed after earlier failure: {}", hook_err);
            Some(err)
        }
    }
}
