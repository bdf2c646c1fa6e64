//! Static tier table
//!
//! Fourteen contiguous, disjoint point ranges covering `[0, 100000]`, ordered
//! from the highest tier down. Standings formatting and reward text depend on
//! the exact content of this table.
//!
//! Points outside the covered span have no category: lookups return `None`
//! and reports show the player as uncategorized.

use serde::Serialize;

/// One tier of the leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
    pub emoji: &'static str,
    pub reward: Option<&'static str>,
}

impl Category {
    pub fn contains(&self, points: i64) -> bool {
        points >= self.min && points <= self.max
    }
}

/// Lowest point value with a category
pub const MIN_CATEGORIZED: i64 = 0;
/// Highest point value with a category
pub const MAX_CATEGORIZED: i64 = 100_000;

pub static CATEGORIES: [Category; 14] = [
    Category { name: "MULADHARA", min: 90_001, max: 100_000, emoji: "🔴", reward: None },
    Category { name: "SVADHISHTHANA", min: 80_001, max: 90_000, emoji: "🟠", reward: None },
    Category { name: "MANIPURA", min: 70_001, max: 80_000, emoji: "🟡", reward: None },
    Category {
        name: "ANAHATA",
        min: 60_001,
        max: 70_000,
        emoji: "🟢",
        reward: Some("⭐️ RÉCOMPENSE : 500 E ⭐️"),
    },
    Category { name: "VISHUDDHA", min: 50_001, max: 60_000, emoji: "🔵", reward: None },
    Category { name: "AJNA", min: 40_001, max: 50_000, emoji: "💠", reward: None },
    Category {
        name: "SAHASRARA",
        min: 30_001,
        max: 40_000,
        emoji: "🟣",
        reward: Some("⭐️ RÉCOMPENSE : 300 E ⭐️"),
    },
    Category { name: "LA COLÉRE", min: 15_001, max: 30_000, emoji: "🔥", reward: None },
    Category { name: "L' ORGUEIL", min: 10_001, max: 15_000, emoji: "🛡", reward: None },
    Category { name: "LA LUXURE", min: 8_001, max: 10_000, emoji: "🔞", reward: None },
    Category {
        name: "L' AVARICE",
        min: 6_001,
        max: 8_000,
        emoji: "💰",
        reward: Some("⭐️ RÉCOMPENSE : 150 E ⭐️\n[sauf pour ceux déjà passé par la]"),
    },
    Category { name: "L' ENVIE", min: 4_001, max: 6_000, emoji: "🥇", reward: None },
    Category { name: "LA GOURMANDISE", min: 2_001, max: 4_000, emoji: "🎂", reward: None },
    Category { name: "LA PARESSE", min: 0, max: 2_000, emoji: "⛱️", reward: None },
];

/// First category in table order whose range contains `points`
pub fn category_for(points: i64) -> Option<&'static Category> {
    CATEGORIES.iter().find(|cat| cat.contains(points))
}

/// Look a category up by name (case-insensitive)
pub fn category_named(name: &str) -> Option<&'static Category> {
    let wanted = name.trim().to_uppercase();
    CATEGORIES.iter().find(|cat| cat.name == wanted)
}

/// `🟢 ANAHATA`, or the uncategorized marker
pub fn category_label(points: i64) -> String {
    match category_for(points) {
        Some(cat) => format!("{} {}", cat.emoji, cat.name),
        None => "❓ Catégorie inconnue".to_string(),
    }
}
