//! Routing of one incoming chat message
//!
//! Order of precedence:
//! 1. a pending confirmation session of the sender in this thread
//!    (a pending standings request does not swallow prefixed commands)
//! 2. prefixed commands
//! 3. quiz detection, for admins only
//!
//! Everything else is ignored. Every reply is split to the chat length limit.

use tracing::{debug, info};
use vvv_core::confirmation::{self, FlowOutcome};
use vvv_core::format::{self, split_message, MAX_MESSAGE_LEN};
use vvv_core::{parse_quiz_text, time, SessionKind};

use crate::commands::{Command, CommandContext};
use crate::AppState;

/// Players shown after a committed quiz
const TOP_AFTER_COMMIT: usize = 10;

/// Handle `text` from `sender_id` in `thread_id`; returns the replies in order
pub async fn handle_message(state: &AppState, sender_id: &str, thread_id: &str, text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut sessions = state.sessions.lock().await;
    let mut store = state.store.lock().await;
    let mut admins = state.admins.lock().await;
    let mut ctx = CommandContext {
        sessions: &mut sessions,
        store: &mut store,
        admins: &mut admins,
        sender_id,
        thread_id,
        now: time::now(),
        uptime: state.started_at.elapsed(),
    };

    route(&mut ctx, text)
        .iter()
        .flat_map(|reply| split_message(reply, MAX_MESSAGE_LEN))
        .collect()
}

fn route(ctx: &mut CommandContext<'_>, text: &str) -> Vec<String> {
    let (sender_id, thread_id, now) = (ctx.sender_id, ctx.thread_id, ctx.now);
    let is_command = text.trim_start().starts_with(ctx.admins.prefix());
    let awaiting_standings = ctx
        .sessions
        .has_pending(sender_id, thread_id, SessionKind::AwaitStandings, now);

    if !(is_command && awaiting_standings) {
        let outcome = confirmation::handle_reply(ctx.sessions, ctx.store, sender_id, thread_id, text, now);
        if let Some(message) = outcome.message() {
            let mut replies = vec![message];
            match outcome {
                FlowOutcome::Committed(_) => {
                    replies.push(format::format_top(ctx.store.players(), TOP_AFTER_COMMIT));
                }
                FlowOutcome::StandingsReplaced(count) => {
                    info!("Standings bootstrapped by {}: {} players", sender_id, count);
                    replies.push(format::format_leaderboard(ctx.store.players()));
                }
                _ => {}
            }
            return replies;
        }
    }

    if let Some(command) = Command::parse(text, ctx.admins.prefix()) {
        debug!("Command {:?} from {} in {}", command, sender_id, thread_id);
        return command.execute(ctx);
    }

    if ctx.admins.is_admin(sender_id) {
        let report = parse_quiz_text(text, ctx.store.identity());
        if let Some(preview) = confirmation::begin_quiz(ctx.sessions, report, sender_id, thread_id, now) {
            return vec![preview];
        }
    }

    Vec::new()
}
