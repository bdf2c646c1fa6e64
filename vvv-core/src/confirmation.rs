//! Human approval of quiz commits
//!
//! ```text
//! NONE → QuizConfirm ──OUI──→ ModoPoints ──<n>──→ COMMITTED
//!             │                    └─(not a number: 50)──→ COMMITTED
//!             └──other──→ CANCELLED
//! any pending state ──TTL──→ EXPIRED
//! ```
//!
//! The super admin's standings bootstrap uses the same session table with an
//! `AwaitStandings` session.

use crate::format::format_update_report;
use crate::leaderboard::{CommitReport, LeaderboardStore};
use crate::parser::{parse_standings_text, QuizReport};
use crate::sessions::{ConsumeOutcome, SessionKind, SessionManager};
use crate::{format, time};
use chrono::{DateTime, Utc};
use tracing::info;

/// Moderator bonus used when the reply to the points prompt is not a number
pub const DEFAULT_MODO_POINTS: i64 = 50;

const AFFIRMATIVE: &[&str] = &["oui", "yes", "confirmer"];

/// A parsed quiz waiting for approval
#[derive(Debug, Clone)]
pub struct PendingQuiz {
    pub report: QuizReport,
    pub quiz_id: String,
    pub date: String,
}

#[derive(Debug, Clone)]
pub enum PendingAction {
    Quiz(PendingQuiz),
    Standings,
}

pub type ConfirmationSessions = SessionManager<PendingAction>;

#[derive(Debug)]
pub enum FlowOutcome {
    /// Quiz approved; the moderator bonus is asked next
    AwaitingModoPoints { moderator: String },
    Committed(CommitReport),
    Cancelled,
    Expired,
    StandingsReplaced(usize),
    StandingsEmpty,
    /// Nothing pending for this user in this thread
    NoSession,
}

impl FlowOutcome {
    /// Reply text for the chat; `None` when the message was not a reply at all
    pub fn message(&self) -> Option<String> {
        let text = match self {
            FlowOutcome::AwaitingModoPoints { moderator } => format!(
                "🎯 Combien de points voulez-vous attribuer au modérateur {} ?\n\n💡 Répondez avec un nombre (par défaut: {} points)\n⏰ Vous avez {} secondes pour répondre.",
                moderator,
                DEFAULT_MODO_POINTS,
                SessionKind::ModoPoints.ttl().num_seconds()
            ),
            FlowOutcome::Committed(report) => format!(
                "✅ MISE À JOUR DU CLASSEMENT TERMINÉE !\n\n{}\n\n🏆 Classement mis à jour avec succès !",
                format_update_report(report)
            ),
            FlowOutcome::Cancelled => "❌ Mise à jour annulée.".to_string(),
            FlowOutcome::Expired => "⏰ Session de confirmation expirée. Veuillez recommencer.".to_string(),
            FlowOutcome::StandingsReplaced(_) => "✅ Classement initial défini avec succès!".to_string(),
            FlowOutcome::StandingsEmpty => {
                "❌ Aucun joueur trouvé dans le classement. Vérifiez le format.".to_string()
            }
            FlowOutcome::NoSession => return None,
        };
        Some(text)
    }
}

pub fn is_affirmative(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    AFFIRMATIVE.iter().any(|word| lower.contains(word))
}

/// Leading signed integer of `reply` (`"75 points"` → 75)
fn leading_integer(reply: &str) -> Option<i64> {
    let trimmed = reply.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse().ok()
}

/// Open a confirmation for `report` and return the preview.
///
/// Returns `None` unless the report names a moderator and at least one
/// participant.
pub fn begin_quiz(
    sessions: &mut ConfirmationSessions,
    report: QuizReport,
    user_id: &str,
    thread_id: &str,
    now: DateTime<Utc>,
) -> Option<String> {
    if !report.is_complete() {
        return None;
    }
    let preview = format::format_quiz_preview(&report);
    info!(
        "Quiz detected from {}: moderator {:?}, {} participant(s)",
        user_id,
        report.moderator_name,
        report.participants.len()
    );
    let pending = PendingQuiz {
        report,
        quiz_id: time::quiz_id(now),
        date: time::quiz_date(now),
    };
    sessions.create_session_at(user_id, thread_id, SessionKind::QuizConfirm, PendingAction::Quiz(pending), now);
    Some(preview)
}

/// Expect a standings snapshot as the next message from `user_id`
pub fn await_standings(sessions: &mut ConfirmationSessions, user_id: &str, thread_id: &str, now: DateTime<Utc>) {
    sessions.create_session_at(user_id, thread_id, SessionKind::AwaitStandings, PendingAction::Standings, now);
}

/// Drive the pending session of `user_id` in `thread_id` with `reply`
pub fn handle_reply(
    sessions: &mut ConfirmationSessions,
    store: &mut LeaderboardStore,
    user_id: &str,
    thread_id: &str,
    reply: &str,
    now: DateTime<Utc>,
) -> FlowOutcome {
    let session = match sessions.consume_latest(user_id, thread_id, None, now) {
        ConsumeOutcome::Found(session) => session,
        ConsumeOutcome::Expired => return FlowOutcome::Expired,
        ConsumeOutcome::NotFound => return FlowOutcome::NoSession,
    };

    match (session.kind, session.payload) {
        (SessionKind::QuizConfirm, PendingAction::Quiz(pending)) => {
            if !is_affirmative(reply) {
                info!("Quiz {} cancelled by {}", pending.quiz_id, user_id);
                return FlowOutcome::Cancelled;
            }
            let moderator = pending.report.moderator_name.clone().unwrap_or_default();
            sessions.create_session_at(user_id, thread_id, SessionKind::ModoPoints, PendingAction::Quiz(pending), now);
            FlowOutcome::AwaitingModoPoints { moderator }
        }
        (SessionKind::ModoPoints, PendingAction::Quiz(mut pending)) => {
            let bonus = leading_integer(reply).unwrap_or(DEFAULT_MODO_POINTS);
            pending.report.moderator_points_explicit = Some(bonus);
            FlowOutcome::Committed(store.commit_quiz(&pending.report, &pending.quiz_id, &pending.date, now))
        }
        (SessionKind::AwaitStandings, _) => {
            let entries = parse_standings_text(reply);
            if entries.is_empty() {
                return FlowOutcome::StandingsEmpty;
            }
            FlowOutcome::StandingsReplaced(store.replace_standings(&entries, now))
        }
        (kind, _) => {
            info!("Session of kind {:?} carried an unexpected payload; dropped", kind);
            FlowOutcome::NoSession
        }
    }
}
