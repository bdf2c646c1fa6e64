//! Standings dump recognition
//!
//! Two line shapes are understood:
//!
//! - `1- 57,781 SYD`: current format, thousands-grouped points, no category
//! - `1. SYD 1000 P (12/05)`: legacy format, only counted below a category
//!   heading such as `🟢ANAHATA [60001-70000 P]`

use crate::categories::CATEGORIES;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// One ranked row of a pasted standings snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsEntry {
    pub rank: u32,
    pub name: String,
    pub points: i64,
    pub category: Option<String>,
    pub last_quiz: Option<String>,
}

static CURRENT_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)-\s*([\d,]+)\s+(.+)$").unwrap());

static LEGACY_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s*(.+?)\s+(\d+)\s*P?\s*(?:\(([^)]+)\))?").unwrap());

static CATEGORY_HEADING: Lazy<Regex> = Lazy::new(|| {
    let emojis: Vec<String> = CATEGORIES
        .iter()
        .map(|c| regex::escape(c.emoji.trim_end_matches('\u{FE0F}')))
        .collect();
    Regex::new(&format!(
        r"(?i)^(?:{})\x{{FE0F}}?\s*([\w\sÀ-ÿ'-]+?)\s*\[[\d\s,.-]+P?\]",
        emojis.join("|")
    ))
    .unwrap()
});

/// Parse a standings dump; unrecognized lines are skipped
pub fn parse_standings_text(text: &str) -> Vec<StandingsEntry> {
    let mut entries = Vec::new();
    let mut current_category: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = CATEGORY_HEADING.captures(line) {
            current_category = Some(caps[1].trim().to_string());
            continue;
        }

        if let Some(caps) = CURRENT_FORMAT.captures(line) {
            let rank = caps[1].parse::<u32>().ok();
            let points = caps[2].replace(',', "").parse::<i64>().ok();
            let name = caps[3].trim().to_uppercase();
            if let (Some(rank), Some(points)) = (rank, points) {
                if !name.is_empty() {
                    entries.push(StandingsEntry {
                        rank,
                        name,
                        points,
                        category: None,
                        last_quiz: None,
                    });
                }
            }
            continue;
        }

        let Some(category) = &current_category else {
            continue;
        };
        if let Some(caps) = LEGACY_FORMAT.captures(line) {
            let (Ok(rank), Ok(points)) = (caps[1].parse::<u32>(), caps[3].parse::<i64>()) else {
                continue;
            };
            entries.push(StandingsEntry {
                rank,
                name: caps[2].trim().to_uppercase(),
                points,
                category: Some(category.clone()),
                last_quiz: caps.get(4).map(|m| m.as_str().to_string()),
            });
        }
    }

    entries
}
