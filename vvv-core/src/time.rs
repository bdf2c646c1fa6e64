//! Timestamp utilities
//!
//! All wall-clock values are UTC. Session expiry and backup retention both
//! compare against these, so neither is monotonic.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Sortable stamp embedded in backup file names (`20250131_235959`)
pub fn backup_stamp(at: DateTime<Utc>) -> String {
    at.format(BACKUP_STAMP_FORMAT).to_string()
}

/// Inverse of [`backup_stamp`]
pub fn parse_backup_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Quiz identifier recorded in the moderation history (`QUIZ-DDHHMMSS`)
pub fn quiz_id(at: DateTime<Utc>) -> String {
    format!("QUIZ-{}", at.format("%d%H%M%S"))
}

/// Day stamp recorded in the moderation history (`DD/MM/YYYY`)
pub fn quiz_date(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y").to_string()
}
