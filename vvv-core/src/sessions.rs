//! Short-lived confirmation sessions
//!
//! A session is keyed by `(user_id, thread_id)`, carries a payload and
//! expires after a kind-specific TTL. Each session is consumed at most once.
//! Expired sessions are removed either when a consumer runs into them or by
//! the periodic sweeper started with [`spawn_sweeper`].

use crate::time;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Waiting for OUI/NON on a quiz preview
    QuizConfirm,
    /// Waiting for the moderator bonus amount
    ModoPoints,
    /// Waiting for a pasted standings snapshot
    AwaitStandings,
}

impl SessionKind {
    pub fn ttl(&self) -> Duration {
        match self {
            SessionKind::QuizConfirm => Duration::minutes(5),
            SessionKind::ModoPoints => Duration::seconds(60),
            SessionKind::AwaitStandings => Duration::minutes(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session<P> {
    pub id: Uuid,
    pub user_id: String,
    pub thread_id: String,
    pub kind: SessionKind,
    pub payload: P,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Creation order; breaks ties between sessions created in the same instant
    seq: u64,
}

impl<P> Session<P> {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Result of [`SessionManager::consume_latest`]
#[derive(Debug)]
pub enum ConsumeOutcome<P> {
    /// The newest live session, now removed
    Found(Session<P>),
    /// Only expired sessions matched; they were removed
    Expired,
    NotFound,
}

pub struct SessionManager<P> {
    sessions: HashMap<Uuid, Session<P>>,
    next_seq: u64,
}

impl<P> Default for SessionManager<P> {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<P> SessionManager<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&mut self, user_id: &str, thread_id: &str, kind: SessionKind, payload: P) -> Uuid {
        self.create_session_at(user_id, thread_id, kind, payload, time::now())
    }

    pub fn create_session_at(
        &mut self,
        user_id: &str,
        thread_id: &str,
        kind: SessionKind,
        payload: P,
        now: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.next_seq += 1;
        self.sessions.insert(
            id,
            Session {
                id,
                user_id: user_id.to_string(),
                thread_id: thread_id.to_string(),
                kind,
                payload,
                created_at: now,
                expires_at: now + kind.ttl(),
                seq: self.next_seq,
            },
        );
        debug!("Session {} created: {:?} for {}/{}", id, kind, user_id, thread_id);
        id
    }

    /// Remove and return the newest live session for the key.
    ///
    /// `kind` narrows the match to one session kind.
    pub fn consume_latest(
        &mut self,
        user_id: &str,
        thread_id: &str,
        kind: Option<SessionKind>,
        now: DateTime<Utc>,
    ) -> ConsumeOutcome<P> {
        let matching: Vec<&Session<P>> = self
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.thread_id == thread_id)
            .filter(|s| kind.map_or(true, |k| s.kind == k))
            .collect();
        if matching.is_empty() {
            return ConsumeOutcome::NotFound;
        }

        let newest_live = matching
            .iter()
            .filter(|s| !s.is_expired(now))
            .max_by_key(|s| (s.created_at, s.seq))
            .map(|s| s.id);

        match newest_live {
            Some(id) => match self.sessions.remove(&id) {
                Some(session) => {
                    debug!("Session {} consumed ({:?})", id, session.kind);
                    ConsumeOutcome::Found(session)
                }
                None => ConsumeOutcome::NotFound,
            },
            None => {
                let expired: Vec<Uuid> = matching.iter().map(|s| s.id).collect();
                for id in &expired {
                    self.sessions.remove(id);
                }
                debug!("{} expired session(s) hit for {}/{}", expired.len(), user_id, thread_id);
                ConsumeOutcome::Expired
            }
        }
    }

    /// Live session of `kind` exists for the key
    pub fn has_pending(&self, user_id: &str, thread_id: &str, kind: SessionKind, now: DateTime<Utc>) -> bool {
        self.sessions.values().any(|s| {
            s.user_id == user_id && s.thread_id == thread_id && s.kind == kind && !s.is_expired(now)
        })
    }

    /// Drop every expired session; returns how many were removed
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Sweep expired sessions every `every` until the runtime shuts down
pub fn spawn_sweeper<P>(manager: Arc<Mutex<SessionManager<P>>>, every: std::time::Duration) -> JoinHandle<()>
where
    P: Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        info!("Session sweeper started ({}s interval)", every.as_secs());

        loop {
            interval.tick().await;
            let removed = manager.lock().await.sweep_expired(time::now());
            if removed > 0 {
                info!("Session sweep removed {} expired session(s)", removed);
            }
        }
    })
}
