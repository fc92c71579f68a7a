use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error type returned by completion hooks and dispatch handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One position of the record sequence: a file record, or the terminal failure.
pub type Item = Result<Record, StreamError>;

/// A single output file written by WRF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// File category, e.g. `wrfout` or `auxhist23`
    pub kind: String,
    pub domain: u32,
    pub instant: DateTime<Utc>,
    /// Whole hours elapsed since the run start (hour 0 is the first hour)
    pub hour_offset: i64,
    pub filename: String,
}

/// Selects records by kind and domain.
///
/// An empty `kind` matches every kind, a zero `domain` matches every domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub kind: String,
    pub domain: u32,
}

impl Filter {
    pub fn new(kind: impl Into<String>, domain: u32) -> Self {
        Self {
            kind: kind.into(),
            domain,
        }
    }

    /// Filter that lets every record through.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn kind(kind: impl Into<String>) -> Self {
        Self::new(kind, 0)
    }

    pub fn domain(domain: u32) -> Self {
        Self::new("", domain)
    }

    pub fn matches(&self, record: &Record) -> bool {
        let kind_ok = self.kind.is_empty() || self.kind == record.kind;
        let domain_ok = self.domain == 0 || self.domain == record.domain;
        kind_ok && domain_ok
    }
}

/// Fieldless view of every failure the crate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingStartInstant,
    MalformedStartLine,
    InvalidStartInstant,
    MissingDomainMarker,
    MalformedFilename,
    InvalidDomain,
    InvalidInstant,
    StreamIncompleteNoSuccessMarker,
    WatchdogTimeout,
    CompletionHookFailed,
    UnderlyingSourceReadFailed,
    MalformedRecord,
    HandlerFailed,
}

/// Failure decoding a single start or timing line.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("start line not found yet")]
    MissingStartInstant,
    #[error("line must contain at least 3 space separated parts, e.g. `d01 2021-08-04_00:00:00 something`")]
    MalformedStartLine,
    #[error("invalid start instant: {0}")]
    InvalidStartInstant(#[source] chrono::ParseError),
    #[error("`for domain` expected to appear in line")]
    MissingDomainMarker,
    #[error("filename expected to be formed by 4 parts separated by underscores")]
    MalformedFilename,
    #[error("invalid domain `{0}`")]
    InvalidDomain(String),
    #[error("invalid time instant: {0}")]
    InvalidInstant(#[source] chrono::ParseError),
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::MissingStartInstant => ErrorKind::MissingStartInstant,
            DecodeError::MalformedStartLine => ErrorKind::MalformedStartLine,
            DecodeError::InvalidStartInstant(_) => ErrorKind::InvalidStartInstant,
            DecodeError::MissingDomainMarker => ErrorKind::MissingDomainMarker,
            DecodeError::MalformedFilename => ErrorKind::MalformedFilename,
            DecodeError::InvalidDomain(_) => ErrorKind::InvalidDomain,
            DecodeError::InvalidInstant(_) => ErrorKind::InvalidInstant,
        }
    }
}

/// Terminal failure of a run. At most one is ever delivered, always as the last item.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("wrong format for start instant line `{line}`: {source}")]
    StartLine {
        line: String,
        #[source]
        source: DecodeError,
    },
    #[error("wrong format for timing line `{line}`: {source}")]
    TimingLine {
        line: String,
        #[source]
        source: DecodeError,
    },
    #[error("input stream completed without success log line")]
    StreamIncompleteNoSuccessMarker,
    #[error("timeout expired: no new files created for more than {timeout:?}")]
    WatchdogTimeout { timeout: Duration },
    #[error("completion hook failed: {0}")]
    CompletionHookFailed(#[source] BoxError),
    #[error("error while reading input: {0}")]
    UnderlyingSourceReadFailed(#[from] std::io::Error),
    #[error("malformed record `{line}`: {source}")]
    MalformedRecord {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamError::StartLine { source, .. } | StreamError::TimingLine { source, .. } => {
                source.kind()
            }
            StreamError::StreamIncompleteNoSuccessMarker => {
                ErrorKind::StreamIncompleteNoSuccessMarker
            }
            StreamError::WatchdogTimeout { .. } => ErrorKind::WatchdogTimeout,
            StreamError::CompletionHookFailed(_) => ErrorKind::CompletionHookFailed,
            StreamError::UnderlyingSourceReadFailed(_) => ErrorKind::UnderlyingSourceReadFailed,
            StreamError::MalformedRecord { .. } => ErrorKind::MalformedRecord,
        }
    }
}

/// Outcome of filtered dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("file handler failed: {0}")]
    HandlerFailed(#[source] BoxError),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Stream(err) => err.kind(),
            DispatchError::HandlerFailed(_) => ErrorKind::HandlerFailed,
        }
    }
}
