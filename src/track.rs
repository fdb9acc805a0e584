use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::{lenient_count, string_or_null};

/// Catalog entry as returned by the tracks endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub id: i64,
    /// Playable media URL.
    pub youtube_url: String,
    pub title: String,
    pub artist: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub year: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub album: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub cover_url: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub play_count: Option<u64>,
}

/// Body of a catalog create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTrack {
    pub youtube_url: String,
    pub title: String,
    pub artist: String,
    pub year: String,
    pub album: String,
    pub cover_url: String,
}

/// Server-aggregated play metrics for one track.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stat {
    pub id: i64,
    pub title: String,
    pub artist: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_plays: Option<u64>,
    /// Accumulated listen time in seconds.
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub last_played: Option<String>,
}

impl Stat {
    pub fn plays(&self) -> u64 {
        self.total_plays.unwrap_or(0)
    }

    /// Calendar date of the last listen, if the backend timestamp parses.
    pub fn last_played_date(&self) -> Option<NaiveDate> {
        let raw = self.last_played.as_deref()?.trim();

        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.date_naive());
        }
        if let Ok(at) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Some(at.date_naive());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
            .map(|at| at.date())
            .ok()
    }
}

/// Body of a "record a listen" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListenReport {
    pub track_id: i64,
    pub duration_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_tolerates_null_optional_fields() {
        let track: Track = serde_json::from_str(
            r#"{"id": 7, "youtube_url": "https://y/1", "title": "T", "artist": "A",
                "year": null, "album": null, "cover_url": null,
                "created_at": "2024-01-01 00:00:00", "is_active": true, "play_count": 3}"#,
        )
        .unwrap();

        assert_eq!(track.id, 7);
        assert_eq!(track.year, "");
        assert_eq!(track.album, "");
        assert_eq!(track.cover_url, "");
        assert_eq!(track.play_count, Some(3));
    }

    #[test]
    fn stat_accepts_numeric_strings_and_nulls() {
        let stats: Vec<Stat> = serde_json::from_str(
            r#"[
                {"id": 1, "title": "T1", "artist": "A1", "total_plays": 4,
                 "total_duration": "312", "last_played": "2024-03-05 18:22:10.512345+00:00"},
                {"id": 2, "title": "T2", "artist": "A2", "total_plays": 0,
                 "total_duration": null, "last_played": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(stats[0].plays(), 4);
        assert_eq!(stats[0].total_duration, Some(312));
        assert_eq!(
            stats[0].last_played_date(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(stats[1].total_duration, None);
        assert_eq!(stats[1].last_played_date(), None);
    }

    #[test]
    fn last_played_without_timezone_parses() {
        let stat = Stat {
            id: 1,
            title: "T".into(),
            artist: "A".into(),
            total_plays: Some(1),
            total_duration: Some(10),
            last_played: Some("2023-12-31 23:59:59".into()),
        };

        assert_eq!(stat.last_played_date(), NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn listen_report_serializes_to_wire_names() {
        let body = serde_json::to_value(ListenReport {
            track_id: 9,
            duration_seconds: 42,
        })
        .unwrap();

        assert_eq!(body, serde_json::json!({"track_id": 9, "duration_seconds": 42}));
    }
}
