//! Heuristic recognition of quiz results and standings in free-form chat text
//!
//! Parsing never fails: lines that match nothing are skipped and an empty
//! [`QuizReport`] simply means nothing was recognized. Callers decide what an
//! empty or partial report means.

pub mod patterns;
pub mod standings;

use crate::identity::IdentityResolver;
use patterns::{ModeratorMatch, MODERATOR_RULES, PARTICIPANT_RULES, RUBRIQUE_PATTERNS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use standings::{parse_standings_text, StandingsEntry};

/// Automatic moderator bonus granted per detected rubrique
pub const POINTS_PER_RUBRIQUE: i64 = 50;

/// A named quiz round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubrique {
    pub name: String,
    pub question_count: u32,
}

/// One participant line; both names are kept for audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub raw_name: String,
    pub resolved_name: String,
    pub points_delta: i64,
}

impl Participant {
    /// True when the alias table redirected this participant
    pub fn was_aliased(&self) -> bool {
        self.raw_name != self.resolved_name
    }
}

/// Everything recognized in one quiz message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizReport {
    pub moderator_name: Option<String>,
    pub moderator_points_explicit: Option<i64>,
    pub rubriques: Vec<Rubrique>,
    pub participants: Vec<Participant>,
}

impl QuizReport {
    pub fn is_empty(&self) -> bool {
        self.moderator_name.is_none() && self.participants.is_empty()
    }

    /// A moderator and at least one participant: worth asking for confirmation
    pub fn is_complete(&self) -> bool {
        self.moderator_name.is_some() && !self.participants.is_empty()
    }

    /// Explicit bonus, else rubrique-derived bonus, else zero
    pub fn moderator_bonus(&self) -> i64 {
        match self.moderator_points_explicit {
            Some(points) => points,
            None => self.rubriques.len() as i64 * POINTS_PER_RUBRIQUE,
        }
    }
}

/// Parse a quiz result message.
///
/// Aliases recorded in `identity` are applied to every participant name.
pub fn parse_quiz_text(text: &str, identity: &IdentityResolver) -> QuizReport {
    let lines: Vec<&str> = text.lines().collect();
    let mut report = QuizReport::default();

    let moderator_line = detect_moderator(&lines).map(|(index, found)| {
        report.moderator_name = Some(found.name);
        report.moderator_points_explicit = found.explicit_points;
        index
    });

    if report.moderator_points_explicit.is_none() {
        report.rubriques = detect_rubriques(&lines);
    }

    let headings: Vec<regex::Regex> = report
        .rubriques
        .iter()
        .map(|r| patterns::rubrique_heading(&r.name))
        .collect();
    let rubrique_names: Vec<String> = report
        .rubriques
        .iter()
        .map(|r| r.name.to_lowercase())
        .collect();

    for (index, line) in lines.iter().enumerate() {
        if Some(index) == moderator_line {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || headings.iter().any(|h| h.is_match(trimmed)) {
            continue;
        }

        let Some((raw_name, points)) = PARTICIPANT_RULES.iter().find_map(|rule| rule.apply(trimmed)) else {
            continue;
        };
        if raw_name.chars().count() < 2 || overlaps_rubrique(&raw_name, &rubrique_names) {
            debug!("Participant candidate rejected: {:?}", raw_name);
            continue;
        }

        let resolved_name = identity.resolve_or_self(&raw_name).to_string();
        if resolved_name != raw_name {
            info!("Alias applied: {} → {}", raw_name, resolved_name);
        }
        report.participants.push(Participant {
            raw_name,
            resolved_name,
            points_delta: points,
        });
    }

    debug!(
        "Parsed quiz: moderator={:?} rubriques={} participants={}",
        report.moderator_name,
        report.rubriques.len(),
        report.participants.len()
    );
    report
}

/// First line (in text order) on which a moderator rule matches, rules in priority order
fn detect_moderator(lines: &[&str]) -> Option<(usize, ModeratorMatch)> {
    lines.iter().enumerate().find_map(|(index, line)| {
        MODERATOR_RULES
            .iter()
            .find_map(|rule| rule.apply(line.trim()))
            .map(|found| (index, found))
    })
}

fn detect_rubriques(lines: &[&str]) -> Vec<Rubrique> {
    let mut rubriques: Vec<Rubrique> = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.chars().count() < 2 {
            continue;
        }
        let Some((name, question_count)) = RUBRIQUE_PATTERNS.iter().find_map(|p| p.apply(trimmed)) else {
            continue;
        };
        let seen = rubriques
            .iter()
            .any(|r| r.name.to_lowercase() == name.to_lowercase());
        if !seen {
            rubriques.push(Rubrique {
                name,
                question_count,
            });
        }
    }
    rubriques
}

/// Substring overlap in either direction, case-insensitive
fn overlaps_rubrique(name: &str, rubrique_names: &[String]) -> bool {
    let lower = name.to_lowercase();
    rubrique_names
        .iter()
        .any(|rub| lower.contains(rub.as_str()) || rub.contains(lower.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AliasMap;
    use crate::storage::MemoryStore;

    fn identity() -> IdentityResolver {
        IdentityResolver::load(Box::new(MemoryStore::<AliasMap>::default()))
    }

    fn deltas(report: &QuizReport) -> Vec<(&str, i64)> {
        report
            .participants
            .iter()
            .map(|p| (p.resolved_name.as_str(), p.points_delta))
            .collect()
    }

    #[test]
    fn test_explicit_moderator_bonus() {
        let report = parse_quiz_text("MODO: ALICE 200\nBOB 50\nCHARLIE -30", &identity());
        assert_eq!(report.moderator_name.as_deref(), Some("ALICE"));
        assert_eq!(report.moderator_points_explicit, Some(200));
        assert!(report.rubriques.is_empty());
        assert_eq!(deltas(&report), vec![("BOB", 50), ("CHARLIE", -30)]);
        assert_eq!(report.moderator_bonus(), 200);
    }

    #[test]
    fn test_rubrique_derived_bonus() {
        let report = parse_quiz_text("MODO : ZED\nHISTOIRE 5Q\nDAVE 20", &identity());
        assert_eq!(report.moderator_name.as_deref(), Some("ZED"));
        assert_eq!(report.moderator_points_explicit, None);
        assert_eq!(
            report.rubriques,
            vec![Rubrique {
                name: "HISTOIRE".to_string(),
                question_count: 5
            }]
        );
        assert_eq!(deltas(&report), vec![("DAVE", 20)]);
        assert_eq!(report.moderator_bonus(), 50);
    }

    #[test]
    fn test_rubriques_skipped_when_bonus_explicit() {
        let report = parse_quiz_text("MODO ALICE 120\nHISTOIRE 5Q\nBOB 10", &identity());
        assert!(report.rubriques.is_empty());
        assert_eq!(deltas(&report), vec![("BOB", 10)]);
    }

    #[test]
    fn test_duplicate_rubriques_ignored() {
        let report = parse_quiz_text("⚔️ MODO : Kira ⚔️\nSPORT 3Q\nsport 4Q\nLP\nX 10", &identity());
        let names: Vec<_> = report.rubriques.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["SPORT", "LP"]);
        assert_eq!(report.rubriques[0].question_count, 3);
        assert_eq!(report.rubriques[1].question_count, 1);
        assert_eq!(report.moderator_bonus(), 100);
    }

    #[test]
    fn test_first_moderator_match_wins() {
        let report = parse_quiz_text("MODO : FIRST\nMODO: SECOND 300", &identity());
        assert_eq!(report.moderator_name.as_deref(), Some("FIRST"));
        assert_eq!(report.moderator_points_explicit, None);
    }

    #[test]
    fn test_compound_calculation_line() {
        let report = parse_quiz_text("MODO: X 10\nNOM 190 P - 100 P : 90 P", &identity());
        assert_eq!(deltas(&report), vec![("NOM", 90)]);
    }

    #[test]
    fn test_short_and_rubrique_like_names_rejected() {
        let report = parse_quiz_text("MODO : Z\nCINEMA 4Q\nA 10\nCINEMA FAN 30\nOK 5", &identity());
        assert_eq!(deltas(&report), vec![("OK", 5)]);
    }

    #[test]
    fn test_aliases_applied_and_audited() {
        let mut identity = identity();
        identity.record_alias("Ryo", "RYOMEN").unwrap();
        let report = parse_quiz_text("MODO: M 5\nryo 40\nSAM 10", &identity);
        assert_eq!(report.participants[0].raw_name, "ryo");
        assert_eq!(report.participants[0].resolved_name, "RYOMEN");
        assert!(report.participants[0].was_aliased());
        assert!(!report.participants[1].was_aliased());
    }

    #[test]
    fn test_nothing_recognized_is_empty_report() {
        let report = parse_quiz_text("bonjour à tous\n\n!!!", &identity());
        assert!(report.is_empty());
        assert!(!report.is_complete());
        assert_eq!(report, QuizReport::default());
    }
}
