//! # V.V.V Core Library
//!
//! Quiz leaderboard core shared by the bot service:
//! - Free-text quiz and standings parsing
//! - Name normalization and merge memory (aliases)
//! - Player store with ranks, tiers, history and backups
//! - Fuzzy duplicate-name detection
//! - Confirmation sessions gating quiz commits
//! - Configuration loading and report formatting

pub mod backups;
pub mod categories;
pub mod config;
pub mod confirmation;
pub mod duplicates;
pub mod error;
pub mod format;
pub mod identity;
pub mod leaderboard;
pub mod parser;
pub mod sessions;
pub mod storage;
pub mod time;

pub use error::{Error, Result};
pub use identity::IdentityResolver;
pub use leaderboard::{LeaderboardStore, Player};
pub use parser::{parse_quiz_text, parse_standings_text, QuizReport};
pub use sessions::{SessionKind, SessionManager};
