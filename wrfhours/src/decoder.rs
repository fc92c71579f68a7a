use crate::classifier::TIMING_PREFIX;
use crate::{DecodeError, Record};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const DOMAIN_SEPARATOR: &str = " for domain";
const RESTART_FILENAME: &str = "restart";
const START_INSTANT_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";
// date and time parts of a filename, joined without separator
const FILE_INSTANT_FORMAT: &str = "%Y-%m-%d%H:%M:%S";

/// Decode a start line, e.g.
/// `d01 2021-08-04_00:00:00  alloc_space_field: domain            2 ,   5403068  bytes allocated`
pub fn decode_start_line(line: &str) -> Result<DateTime<Utc>, DecodeError> {
    let parts: Vec<&str> = line.splitn(3, char::is_whitespace).collect();
    if parts.len() != 3 {
        return Err(DecodeError::MalformedStartLine);
    }

    let naive = NaiveDateTime::parse_from_str(parts[1], START_INSTANT_FORMAT)
        .map_err(DecodeError::InvalidStartInstant)?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Decode a timing line, e.g.
/// `Timing for Writing auxhist23_d03_2021-08-04_01:00:00 for domain        3:   10.02259 elapsed seconds`
///
/// Returns `Ok(None)` for restart checkpoints, which are not simulation output.
pub fn decode_timing_line(
    line: &str,
    start: Option<DateTime<Utc>>,
) -> Result<Option<Record>, DecodeError> {
    let start = start.ok_or(DecodeError::MissingStartInstant)?;

    let rest = line.strip_prefix(TIMING_PREFIX).unwrap_or(line);

    let pieces: Vec<&str> = rest.split(DOMAIN_SEPARATOR).collect();
    if pieces.len() != 2 {
        return Err(DecodeError::MissingDomainMarker);
    }

    let filename = pieces[0].trim();
    if filename == RESTART_FILENAME {
        return Ok(None);
    }

    // auxhist23 / d03 / 2021-08-04 / 01:00:00
    let parts: Vec<&str> = filename.split('_').collect();
    if parts.len() != 4 {
        return Err(DecodeError::MalformedFilename);
    }

    let domain = parse_domain(parts[1])?;

    let instant = NaiveDateTime::parse_from_str(&format!("{}{}", parts[2], parts[3]), FILE_INSTANT_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(DecodeError::InvalidInstant)?;

    Ok(Some(Record {
        kind: parts[0].to_string(),
        domain,
        instant,
        hour_offset: hour_offset(start, instant),
        filename: filename.to_string(),
    }))
}

fn parse_domain(token: &str) -> Result<u32, DecodeError> {
    token
        .strip_prefix('d')
        .and_then(|digits| digits.parse::<u32>().ok())
        .filter(|domain| *domain > 0)
        .ok_or_else(|| DecodeError::InvalidDomain(token.to_string()))
}

/// Whole hours from `start` to `instant`, truncated toward zero.
pub fn hour_offset(start: DateTime<Utc>, instant: DateTime<Utc>) -> i64 {
    (instant - start).num_hours()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::Duration;

    fn start() -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2021, 8, 4, 0, 0, 0).unwrap())
    }

    fn timing(filename: &str) -> String {
        format!(
            "Timing for Writing {} for domain        1:    0.10153 elapsed seconds",
            filename
        )
    }

    #[test]
    fn test_decode_start_line() {
        let instant = decode_start_line(
            "d01 2021-08-04_00:00:00  alloc_space_field: domain            2 ,                5403068  bytes allocated",
        )
        .unwrap();
        assert_eq!(instant, start().unwrap());
    }

    #[test]
    fn test_decode_start_line_errors() {
        let err = decode_start_line("d01 2021-08-04_00:00:00").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedStartLine);

        let err = decode_start_line("d01 2021-08-RR_00:00:00 ciao").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStartInstant);
    }

    #[test]
    fn test_decode_timing_line() {
        let line = "Timing for Writing wrfout_d01_2021-08-04_00:00:00 for domain        1:    0.10 elapsed seconds";
        let record = decode_timing_line(line, start()).unwrap().unwrap();

        assert_eq!(
            record,
            Record {
                kind: "wrfout".to_string(),
                domain: 1,
                instant: start().unwrap(),
                hour_offset: 0,
                filename: "wrfout_d01_2021-08-04_00:00:00".to_string(),
            }
        );

        // same input, same output
        assert_eq!(decode_timing_line(line, start()).unwrap().unwrap(), record);
    }

    #[test]
    fn test_decode_timing_line_later_hour() {
        let record = decode_timing_line(&timing("auxhist23_d03_2021-08-06_00:00:00"), start())
            .unwrap()
            .unwrap();

        assert_eq!(record.kind, "auxhist23");
        assert_eq!(record.domain, 3);
        assert_eq!(record.hour_offset, 48);
    }

    #[test]
    fn test_restart_is_skipped() {
        let line = "Timing for Writing restart for domain        1:    1.33332 elapsed seconds";
        assert!(decode_timing_line(line, start()).unwrap().is_none());
    }

    #[test]
    fn test_missing_start_instant() {
        let err = decode_timing_line(&timing("wrfout_d01_2021-08-04_00:00:00"), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingStartInstant);
    }

    #[test]
    fn test_decode_timing_line_errors() {
        let cases = [
            (
                "Timing for Writing auxhist23_d01_2021-08-06_00:00:00 for!!domain        1:    0.10153 elapsed seconds".to_string(),
                ErrorKind::MissingDomainMarker,
            ),
            (timing("auxhist23_d01_2021-08-06_00_00:00"), ErrorKind::MalformedFilename),
            (timing("auxhist23_d01_2021-08-06"), ErrorKind::MalformedFilename),
            (timing("auxhist23_dF1_2021-08-06_00:00:00"), ErrorKind::InvalidDomain),
            (timing("auxhist23_01_2021-08-06_00:00:00"), ErrorKind::InvalidDomain),
            (timing("auxhist23_d00_2021-08-06_00:00:00"), ErrorKind::InvalidDomain),
            (timing("auxhist23_d01_2021-08-RR_00:00:00"), ErrorKind::InvalidInstant),
        ];

        for (line, expected) in cases {
            let err = decode_timing_line(&line, start()).unwrap_err();
            assert_eq!(err.kind(), expected, "line: {}", line);
        }
    }

    #[test]
    fn test_hour_offset_truncates() {
        let start = start().unwrap();

        assert_eq!(hour_offset(start, start + Duration::minutes(59)), 0);
        assert_eq!(hour_offset(start, start + Duration::minutes(89)), 1);
        assert_eq!(hour_offset(start, start + Duration::minutes(120)), 2);
        // toward zero, not floor
        assert_eq!(hour_offset(start, start - Duration::minutes(30)), 0);
        assert_eq!(hour_offset(start, start - Duration::minutes(90)), -1);
    }
}
