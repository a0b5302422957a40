// src/bulletin/parser.rs
//! Listing text → `EarthquakeRecord`s.
//!
//! Example data line (columns are whitespace separated, the place name
//! runs to the end of the line):
//!
//! ```text
//! 2024.10.20 12:25:30  40.8253   29.0748        5.0      -.-  2.1  -.-   IZMIT KORFEZI (MARMARA DENIZI)   İlksel
//! ```

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::LineError;
use super::types::{EarthquakeRecord, Magnitude, DATE_FORMAT, TIME_FORMAT};

/// Preamble lines at the top of the KOERI `<pre>` block.
pub const DEFAULT_HEADER_LINES: usize = 6;
/// Eight fixed columns plus at least one word of place name.
pub const MIN_FIELDS: usize = 9;
/// Printed in a magnitude column when that scale was not computed.
pub const MAGNITUDE_SENTINEL: &str = "-.-";

// "İlksel" marks a preliminary solution, "REVIZE01 (2023.02.06 04:17:32)" a revised one.
static STATUS_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"İlksel|Ilksel|REVIZE\d*(?:\s*\([^)]*\))?").expect("static regex")
});

/// Outcome of one parse pass: kept records plus per-reason skip counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub records: Vec<EarthquakeRecord>,
    /// Non-empty lines examined after the header.
    pub lines_seen: usize,
    pub malformed: usize,
    pub unparseable: usize,
    pub invalid: usize,
}

impl ParseReport {
    pub fn skipped(&self) -> usize {
        self.malformed + self.unparseable + self.invalid
    }

    fn count(&mut self, err: &LineError) {
        match err {
            LineError::Malformed { .. } => self.malformed += 1,
            LineError::Parse { .. } => self.unparseable += 1,
            LineError::Invalid(_) => self.invalid += 1,
        }
    }
}

/// Parse the whole listing, skipping `header_lines` preamble lines.
/// Bad lines are logged and counted; they never abort the pass.
pub fn parse_bulletin(text: &str, header_lines: usize) -> ParseReport {
    let mut report = ParseReport::default();

    for (idx, raw) in text.lines().enumerate().skip(header_lines) {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        report.lines_seen += 1;

        match parse_line(line) {
            Ok(rec) => report.records.push(rec),
            Err(e) => {
                tracing::debug!(
                    target: "bulletin",
                    line_no = idx + 1,
                    reason = e.reason(),
                    error = %e,
                    line,
                    "skipping bulletin line"
                );
                report.count(&e);
            }
        }
    }

    report
}

/// Parse one trimmed data line.
pub fn parse_line(line: &str) -> Result<EarthquakeRecord, LineError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < MIN_FIELDS {
        return Err(LineError::Malformed {
            tokens: parts.len(),
            min: MIN_FIELDS,
        });
    }

    let date = parts[0];
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| parse_err("date", date))?;
    let time = parts[1];
    NaiveTime::parse_from_str(time, TIME_FORMAT).map_err(|_| parse_err("time", time))?;

    let latitude = parse_number("latitude", parts[2])?;
    let longitude = parse_number("longitude", parts[3])?;
    let depth_km = parse_number("depth_km", parts[4])?;
    let magnitude_md = parse_magnitude("magnitude_md", parts[5])?;
    let magnitude_ml = parse_magnitude("magnitude_ml", parts[6])?;
    let magnitude_mw = parse_magnitude("magnitude_mw", parts[7])?;
    let location = clean_location(&parts[8..].join(" "));

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(LineError::Invalid("latitude out of range"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(LineError::Invalid("longitude out of range"));
    }
    if depth_km < 0.0 {
        return Err(LineError::Invalid("negative depth"));
    }
    if location.is_empty() {
        return Err(LineError::Invalid("empty location"));
    }

    Ok(EarthquakeRecord {
        date: date.to_string(),
        time: time.to_string(),
        latitude,
        longitude,
        depth_km,
        magnitude_md,
        magnitude_ml,
        magnitude_mw,
        location,
    })
}

/// Drop status markers and collapse whitespace.
pub fn clean_location(raw: &str) -> String {
    let mut out = raw.to_string();
    // Removing one marker can splice two halves into another.
    while STATUS_MARKER.is_match(&out) {
        out = STATUS_MARKER.replace_all(&out, "").into_owned();
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_number(field: &'static str, token: &str) -> Result<f64, LineError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(parse_err(field, token)),
    }
}

fn parse_magnitude(field: &'static str, token: &str) -> Result<Magnitude, LineError> {
    if token == MAGNITUDE_SENTINEL {
        return Ok(Magnitude::ABSENT);
    }
    // A printed 0.0 means "not computed" on the wire too; keep both paths in step.
    parse_number(field, token).map(Magnitude::from)
}

fn parse_err(field: &'static str, token: &str) -> LineError {
    LineError::Parse {
        field,
        token: token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IZMIT: &str = "2024.10.20 12:25:30  40.8253   29.0748   5.0   -.-  2.1  -.-   IZMIT KORFEZI (MARMARA DENIZI)";

    #[test]
    fn parses_reference_line() {
        let r = parse_line(IZMIT).unwrap();
        assert_eq!(r.date, "2024.10.20");
        assert_eq!(r.time, "12:25:30");
        assert_eq!(r.latitude, 40.8253);
        assert_eq!(r.longitude, 29.0748);
        assert_eq!(r.depth_km, 5.0);
        assert_eq!(r.magnitude_md.value(), 0.0);
        assert!(!r.magnitude_md.is_reported());
        assert_eq!(r.magnitude_ml.value(), 2.1);
        assert_eq!(r.magnitude_mw.value(), 0.0);
        assert_eq!(r.location, "IZMIT KORFEZI (MARMARA DENIZI)");
    }

    #[test]
    fn strips_preliminary_and_revised_markers() {
        assert_eq!(clean_location("SILE (ISTANBUL) İlksel"), "SILE (ISTANBUL)");
        assert_eq!(
            clean_location("PAZARCIK (KAHRAMANMARAS) REVIZE01 (2023.02.06 04:17:32)"),
            "PAZARCIK (KAHRAMANMARAS)"
        );
        assert_eq!(clean_location("REVREVIZEIZE X"), "X");
    }

    #[test]
    fn printed_zero_magnitude_is_absent() {
        let r = parse_line("2024.10.20 12:25:30 40.8 29.0 5.0 0.0 2.1 -.- YER").unwrap();
        assert!(!r.magnitude_md.is_reported());
        let back: EarthquakeRecord =
            serde_json::from_str(&serde_json::to_string(&r).unwrap()).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn short_lines_are_malformed() {
        let err = parse_line("2024.10.20 12:25:30 40.8 29.0 5.0 -.- 2.1 -.-").unwrap_err();
        assert_eq!(err, LineError::Malformed { tokens: 8, min: 9 });
    }

    #[test]
    fn bad_numeric_token_is_a_parse_error() {
        let err = parse_line("2024.10.20 12:25:30 40.8x 29.0 5.0 -.- 2.1 -.- YER").unwrap_err();
        assert_eq!(err.reason(), "parse");
        let err = parse_line("2024.10.20 12:25:30 NaN 29.0 5.0 -.- 2.1 -.- YER").unwrap_err();
        assert_eq!(err.reason(), "parse");
    }

    #[test]
    fn label_made_only_of_markers_is_rejected() {
        let err = parse_line("2024.10.20 12:25:30 40.8 29.0 5.0 -.- 2.1 -.- İlksel").unwrap_err();
        assert_eq!(err, LineError::Invalid("empty location"));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(parse_line("2024.10.20 12:25:30 91.0 29.0 5.0 -.- 2.1 -.- YER").is_err());
        assert!(parse_line("2024.10.20 12:25:30 40.0 181.0 5.0 -.- 2.1 -.- YER").is_err());
        assert!(parse_line("2024.10.20 12:25:30 40.0 29.0 -1.0 -.- 2.1 -.- YER").is_err());
    }

    #[test]
    fn header_is_skipped_and_counts_are_kept() {
        let text = format!(
            "h1\nh2\nh3\nh4\nh5\n{IZMIT}\n{IZMIT}\n\nshort line\n2024.10.20 99:99:99 1 1 1 -.- 2 -.- X\n"
        );
        let rep = parse_bulletin(&text, DEFAULT_HEADER_LINES);
        assert_eq!(rep.records.len(), 1);
        assert_eq!(rep.lines_seen, 3);
        assert_eq!(rep.malformed, 1);
        assert_eq!(rep.unparseable, 1);
        assert_eq!(rep.skipped(), 2);
    }
}
