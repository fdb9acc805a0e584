//! Bulk track import.
//!
//! The operator pastes one track per line:
//!
//! ```text
//! media URL | title | artist | year | album | cover URL
//! ```
//!
//! The first three fields are required. Missing or empty optional fields
//! take their value from [`ImportDefaults`]. Blank lines are ignored.

use crate::catalog::TrackCatalog;
use crate::config::ImportDefaults;
use crate::track::NewTrack;

const FIELD_DELIMITER: char = '|';
const REQUIRED_FIELDS: [&str; 3] = ["media URL", "title", "artist"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: missing {field}")]
pub struct LineError {
    /// 1-based line number in the pasted text.
    pub line: usize,
    pub field: &'static str,
}

/// Aggregate outcome of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Number of lines that will be considered, i.e. the non-blank ones.
pub fn count_lines(input: &str) -> usize {
    input.lines().filter(|line| !line.trim().is_empty()).count()
}

pub fn parse_line(line: &str, defaults: &ImportDefaults) -> Result<NewTrack, &'static str> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).map(str::trim).collect();

    for (position, name) in REQUIRED_FIELDS.iter().enumerate() {
        if fields.get(position).map_or(true, |field| field.is_empty()) {
            return Err(*name);
        }
    }

    let optional = |position: usize, fallback: &str| -> String {
        match fields.get(position) {
            Some(field) if !field.is_empty() => field.to_string(),
            _ => fallback.to_string(),
        }
    };

    Ok(NewTrack {
        youtube_url: fields[0].to_string(),
        title: fields[1].to_string(),
        artist: fields[2].to_string(),
        year: optional(3, &defaults.year),
        album: optional(4, &defaults.album),
        cover_url: optional(5, &defaults.cover_url),
    })
}

/// Parse every non-blank line, keeping input order.
pub fn parse_bulk(input: &str, defaults: &ImportDefaults) -> Vec<Result<NewTrack, LineError>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_line(line, defaults).map_err(|field| LineError {
                line: index + 1,
                field,
            })
        })
        .collect()
}

/// Submit each valid line to the catalog, one at a time and in input
/// order. Malformed lines and rejected creates are both counted as
/// failures; nothing is retried.
pub async fn import<C: TrackCatalog>(
    catalog: &C,
    input: &str,
    defaults: &ImportDefaults,
) -> ImportReport {
    let mut report = ImportReport::default();

    for parsed in parse_bulk(input, defaults) {
        let track = match parsed {
            Ok(track) => track,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed import line");
                report.failed += 1;
                continue;
            }
        };

        match catalog.create(&track).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                tracing::warn!(error = %e, title = %track.title, "Track create failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "Bulk import finished"
    );
    report
}
