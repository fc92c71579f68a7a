/// Prefix of the first domain-1 line, which carries the run start instant.
pub const START_MARKER: &str = "d01 ";

/// Prefix of the line WRF logs after writing an output file.
pub const TIMING_PREFIX: &str = "Timing for Writing ";

/// Suffix of the line WRF logs when the run ends successfully.
pub const SUCCESS_MARKER: &str = "SUCCESS COMPLETE WRF";

/// Shape of a single WRF log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    StartInstant,
    Timing,
    Completion,
    Other,
}

/// Decide which recognized shape a raw line has.
///
/// Start lines are only recognized while the run start is still unknown, so
/// later `d01 ...` lines fall through as ordinary noise.
pub fn classify(line: &str, start_known: bool) -> LineKind {
    if !start_known && line.starts_with(START_MARKER) {
        return LineKind::StartInstant;
    }

    if line.starts_with(TIMING_PREFIX) {
        return LineKind::Timing;
    }

    if line.ends_with(SUCCESS_MARKER) {
        return LineKind::Completion;
    }

    LineKind::Other
}
