//! Durable player records, point deltas, ranks and categories
//!
//! [`LeaderboardStore`] is the only writer of the players snapshot and the
//! moderation history. Every mutation ends with [`LeaderboardStore::assign_ranks`]
//! so ranks stay dense (1..N) and categories match points.
//!
//! Persistence failures are logged and swallowed: the in-memory state stays
//! authoritative until the next successful save.

use crate::backups::{BackupInfo, BackupManager};
use crate::categories::{category_for, Category};
use crate::config::DataDir;
use crate::identity::{AliasMap, IdentityResolver};
use crate::parser::{QuizReport, StandingsEntry};
use crate::storage::{JsonFile, MemoryStore, SnapshotStore};
use crate::{time, Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Moderator name recorded for administrative multi-account merges
pub const ADMIN_MERGE_MODERATOR: &str = "ADMIN-MERGE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub points: i64,
    #[serde(default = "time::now")]
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub rank: u32,
    /// Derived from `points` on every re-rank; `None` outside the tier table
    #[serde(default, skip_deserializing)]
    pub category: Option<&'static Category>,
}

impl Player {
    pub fn new(name: impl Into<String>, points: i64, join_date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            points,
            join_date,
            rank: 0,
            category: category_for(points),
        }
    }
}

/// Persisted shape of `leaderboard.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardFile {
    #[serde(default)]
    pub players: Vec<Player>,
}

/// Append-only entry of `history.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRecord {
    pub modo: String,
    pub quiz_id: String,
    pub date: String,
}

/// Points of one player before and after a delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreChange {
    pub name: String,
    pub before: i64,
    pub after: i64,
    pub delta: i64,
}

/// Outcome of [`LeaderboardStore::commit_quiz`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub quiz_id: String,
    /// Participant changes, in report order
    pub changes: Vec<ScoreChange>,
    /// Moderator bonus, when a moderator was identified and the bonus is positive
    pub bonus: Option<ScoreChange>,
}

/// Outcome of a two-player merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub source: String,
    pub target: String,
    pub source_points: i64,
    pub target_before: i64,
    pub target_after: i64,
}

/// Outcome of a multi-account merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeManyOutcome {
    pub main: String,
    pub before: i64,
    pub after: i64,
    pub rank: u32,
    /// `(name, points)` of every absorbed account
    pub merged: Vec<(String, i64)>,
}

impl MergeManyOutcome {
    pub fn total_merged(&self) -> i64 {
        self.merged.iter().map(|(_, points)| points).sum()
    }
}

pub struct LeaderboardStore {
    players: Vec<Player>,
    history: Vec<ModerationRecord>,
    identity: IdentityResolver,
    players_store: Box<dyn SnapshotStore<LeaderboardFile>>,
    history_store: Box<dyn SnapshotStore<Vec<ModerationRecord>>>,
    backups: Option<BackupManager>,
}

impl LeaderboardStore {
    /// Open the JSON files under `data_dir`
    pub fn open(data_dir: &DataDir, backup_retention: Duration) -> Self {
        let identity =
            IdentityResolver::load(Box::new(JsonFile::<AliasMap>::new(data_dir.merge_memory_path())));
        Self::with_stores(
            Box::new(JsonFile::new(data_dir.leaderboard_path())),
            Box::new(JsonFile::new(data_dir.history_path())),
            identity,
            Some(BackupManager::new(data_dir.backup_dir(), backup_retention)),
        )
    }

    /// Store with no files and no backups
    pub fn in_memory() -> Self {
        Self::with_stores(
            Box::new(MemoryStore::default()),
            Box::new(MemoryStore::default()),
            IdentityResolver::load(Box::new(MemoryStore::<AliasMap>::default())),
            None,
        )
    }

    pub fn with_stores(
        players_store: Box<dyn SnapshotStore<LeaderboardFile>>,
        history_store: Box<dyn SnapshotStore<Vec<ModerationRecord>>>,
        identity: IdentityResolver,
        backups: Option<BackupManager>,
    ) -> Self {
        let players = match players_store.load() {
            Ok(file) => file.map(|f| f.players).unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load leaderboard, starting empty: {}", e);
                Vec::new()
            }
        };
        let history = match history_store.load() {
            Ok(history) => history.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load moderation history, starting empty: {}", e);
                Vec::new()
            }
        };
        info!(
            "Leaderboard loaded: {} players, {} moderation records",
            players.len(),
            history.len()
        );

        let mut store = Self {
            players,
            history,
            identity,
            players_store,
            history_store,
            backups,
        };
        store.assign_ranks();
        store
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Exact match on the trimmed name first, then case-insensitive
    pub fn find_player(&self, name: &str) -> Option<&Player> {
        self.position_of(name).map(|index| &self.players[index])
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// First `n` players in rank order
    pub fn top(&self, n: usize) -> &[Player] {
        &self.players[..n.min(self.players.len())]
    }

    pub fn history(&self) -> &[ModerationRecord] {
        &self.history
    }

    /// Most recent `limit` moderation records, oldest first
    pub fn moderation_history(&self, limit: usize) -> &[ModerationRecord] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    pub fn identity_mut(&mut self) -> &mut IdentityResolver {
        &mut self.identity
    }

    pub fn snapshot(&self) -> LeaderboardFile {
        LeaderboardFile {
            players: self.players.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add `delta` to `name`, creating the player (uppercased) when absent
    pub fn apply_delta(&mut self, name: &str, delta: i64) -> ScoreChange {
        let change = self.add_points(name, delta, time::now());
        self.assign_ranks();
        self.persist_players();
        change
    }

    /// Sort by points desc then join date asc; dense 1-based ranks; refresh categories
    pub fn assign_ranks(&mut self) {
        self.players
            .sort_by(|a, b| b.points.cmp(&a.points).then(a.join_date.cmp(&b.join_date)));
        for (index, player) in self.players.iter_mut().enumerate() {
            player.rank = index as u32 + 1;
            player.category = category_for(player.points);
        }
    }

    /// Move every point of `source` onto `target` and alias `source → target`
    pub fn merge_players(&mut self, source: &str, target: &str) -> Result<MergeOutcome> {
        let source_index = self
            .position_of(source)
            .ok_or_else(|| Error::NotFound(format!("player {}", source.trim())))?;
        let target_index = self
            .position_of(target)
            .ok_or_else(|| Error::NotFound(format!("player {}", target.trim())))?;
        if source_index == target_index {
            return Err(Error::InvalidInput(format!(
                "cannot merge {} into itself",
                self.players[source_index].name
            )));
        }

        let removed = self.players.remove(source_index);
        let target_index = if target_index > source_index {
            target_index - 1
        } else {
            target_index
        };
        let target_player = &mut self.players[target_index];
        let target_before = target_player.points;
        target_player.points = target_player.points.saturating_add(removed.points);
        let outcome = MergeOutcome {
            source: removed.name.clone(),
            target: target_player.name.clone(),
            source_points: removed.points,
            target_before,
            target_after: target_player.points,
        };

        self.identity.record_alias(&outcome.source, &outcome.target)?;
        self.assign_ranks();
        self.persist_players();
        info!(
            "Merged {} ({}) into {} ({} → {})",
            outcome.source, outcome.source_points, outcome.target, target_before, outcome.target_after
        );
        Ok(outcome)
    }

    /// Absorb every account in `others` into `main`.
    ///
    /// All names must exist and at least one point must move; nothing is
    /// mutated otherwise.
    pub fn merge_many(&mut self, main: &str, others: &[String], now: DateTime<Utc>) -> Result<MergeManyOutcome> {
        let missing: Vec<String> = std::iter::once(main)
            .chain(others.iter().map(String::as_str))
            .filter(|name| self.position_of(name).is_none())
            .map(|name| name.trim().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::NotFound(missing.join(", ")));
        }

        let main_name = self
            .find_player(main)
            .map(|p| p.name.clone())
            .ok_or_else(|| Error::NotFound(main.trim().to_string()))?;
        let mut seen = HashSet::new();
        let mut absorbed: Vec<(String, i64)> = Vec::new();
        for other in others {
            let Some(index) = self.position_of(other) else {
                continue;
            };
            let player = &self.players[index];
            if player.name == main_name || !seen.insert(player.name.clone()) {
                continue;
            }
            absorbed.push((player.name.clone(), player.points));
        }

        let total: i64 = absorbed.iter().map(|(_, points)| points).sum();
        if total == 0 {
            return Err(Error::InvalidInput("no points to merge".to_string()));
        }

        for (name, _) in &absorbed {
            self.players.retain(|p| &p.name != name);
            self.identity.record_alias(name, &main_name)?;
        }
        let main_index = self
            .position_of(&main_name)
            .ok_or_else(|| Error::Internal(format!("{} vanished during merge", main_name)))?;
        let before = self.players[main_index].points;
        self.players[main_index].points = before.saturating_add(total);

        self.assign_ranks();
        self.history.push(ModerationRecord {
            modo: ADMIN_MERGE_MODERATOR.to_string(),
            quiz_id: format!("MERGE-{}", now.timestamp_millis()),
            date: time::quiz_date(now),
        });
        self.persist_players();
        self.persist_history();
        self.backup(now);

        let main_player = self.find_player(&main_name);
        let outcome = MergeManyOutcome {
            main: main_name.clone(),
            before,
            after: main_player.map(|p| p.points).unwrap_or(before),
            rank: main_player.map(|p| p.rank).unwrap_or_default(),
            merged: absorbed,
        };
        info!(
            "Multi-merge into {}: {} account(s), +{} points",
            outcome.main,
            outcome.merged.len(),
            total
        );
        Ok(outcome)
    }

    /// Apply a confirmed quiz: participant deltas, moderator bonus, history, backup
    ///
    /// Names are resolved against the alias table as it stands now, so a merge
    /// made while the quiz awaited confirmation still applies.
    pub fn commit_quiz(
        &mut self,
        report: &QuizReport,
        quiz_id: &str,
        date: &str,
        now: DateTime<Utc>,
    ) -> CommitReport {
        let changes: Vec<ScoreChange> = report
            .participants
            .iter()
            .map(|p| {
                let name = self.identity.resolve_or_self(&p.raw_name).to_string();
                self.add_points(&name, p.points_delta, now)
            })
            .collect();

        let moderator = report
            .moderator_name
            .as_deref()
            .map(|name| self.identity.resolve_or_self(name).to_string());
        let bonus_points = report.moderator_bonus();
        let bonus = match &moderator {
            Some(name) if bonus_points > 0 => Some(self.add_points(name, bonus_points, now)),
            _ => None,
        };

        self.assign_ranks();
        if let Some(moderator) = moderator {
            self.history.push(ModerationRecord {
                modo: moderator,
                quiz_id: quiz_id.to_string(),
                date: date.to_string(),
            });
        }

        self.persist_players();
        self.persist_history();
        self.backup(now);
        self.sweep_backups_logged(now);

        info!(
            "Quiz {} committed: {} participant change(s), bonus {:?}",
            quiz_id,
            changes.len(),
            bonus.as_ref().map(|b| b.delta)
        );
        CommitReport {
            quiz_id: quiz_id.to_string(),
            changes,
            bonus,
        }
    }

    /// Overwrite all players from a pasted standings snapshot
    pub fn replace_standings(&mut self, entries: &[StandingsEntry], now: DateTime<Utc>) -> usize {
        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.name.to_uppercase()) {
                warn!("Duplicate standings entry ignored: {}", entry.name);
                continue;
            }
            players.push(Player::new(entry.name.clone(), entry.points, now));
        }

        self.players = players;
        self.assign_ranks();
        self.persist_players();
        self.backup(now);
        info!("Standings replaced: {} players", self.players.len());
        self.players.len()
    }

    // ------------------------------------------------------------------
    // Backups
    // ------------------------------------------------------------------

    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        match &self.backups {
            Some(backups) => backups.list(),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the players with the content of `filename`; returns the player count
    pub fn restore_backup(&mut self, filename: &str) -> Result<usize> {
        let backups = self
            .backups
            .as_ref()
            .ok_or_else(|| Error::Internal("backups are not configured".to_string()))?;
        let file = backups.load(filename.trim())?;
        self.players = file.players;
        self.assign_ranks();
        self.persist_players();
        info!("Leaderboard restored from {}: {} players", filename.trim(), self.players.len());
        Ok(self.players.len())
    }

    /// Delete backups older than the retention window
    pub fn sweep_backups(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        match &self.backups {
            Some(backups) => backups.sweep(now),
            None => Ok(Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Merge-name parsing
    // ------------------------------------------------------------------

    /// Split a `merge` argument into player names.
    ///
    /// Commas separate names explicitly. Without commas, up to three words are
    /// taken one name each; longer inputs are segmented greedily into the
    /// longest known player names, falling back to plain words when fewer
    /// than two names are recognized.
    pub fn parse_merge_names(&self, input: &str) -> Vec<String> {
        if input.contains(',') {
            return input
                .split(',')
                .map(|name| name.trim().to_uppercase())
                .filter(|name| !name.is_empty())
                .collect();
        }

        let words: Vec<&str> = input.split_whitespace().collect();
        let plain: Vec<String> = words.iter().map(|w| w.to_uppercase()).collect();
        if words.len() <= 3 {
            return plain;
        }

        let known: HashSet<&str> = self.players.iter().map(|p| p.name.as_str()).collect();
        let mut candidates: Vec<(usize, usize, String)> = Vec::new();
        for start in 0..words.len() {
            for end in start + 1..=words.len() {
                let candidate = words[start..end].join(" ").to_uppercase();
                if known.contains(candidate.as_str()) {
                    candidates.push((start, end, candidate));
                }
            }
        }
        candidates.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)));

        let mut used = vec![false; words.len()];
        let mut selected = Vec::new();
        for (start, end, name) in candidates {
            if used[start..end].iter().any(|u| *u) {
                continue;
            }
            used[start..end].iter_mut().for_each(|u| *u = true);
            selected.push((start, name));
        }
        // The first name is the merge target, so keep input order
        selected.sort_by_key(|(start, _)| *start);

        if selected.len() < 2 {
            debug!("Merge name segmentation found {} name(s), using plain words", selected.len());
            return plain;
        }
        selected.into_iter().map(|(_, name)| name).collect()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn position_of(&self, name: &str) -> Option<usize> {
        let trimmed = name.trim();
        self.players
            .iter()
            .position(|p| p.name == trimmed)
            .or_else(|| {
                let upper = trimmed.to_uppercase();
                self.players.iter().position(|p| p.name.to_uppercase() == upper)
            })
    }

    /// Delta without re-ranking or saving
    fn add_points(&mut self, name: &str, delta: i64, now: DateTime<Utc>) -> ScoreChange {
        let index = match self.position_of(name) {
            Some(index) => index,
            None => {
                let canonical = name.trim().to_uppercase();
                info!("New player: {}", canonical);
                self.players.push(Player::new(canonical, 0, now));
                self.players.len() - 1
            }
        };
        let player = &mut self.players[index];
        let before = player.points;
        player.points = before.saturating_add(delta);
        debug!("{}: {} → {} ({:+})", player.name, before, player.points, delta);
        ScoreChange {
            name: player.name.clone(),
            before,
            after: player.points,
            delta,
        }
    }

    fn persist_players(&self) {
        if let Err(e) = self.players_store.save_all(&self.snapshot()) {
            error!("Failed to save leaderboard: {}", e);
        }
    }

    fn persist_history(&self) {
        if let Err(e) = self.history_store.save_all(&self.history) {
            error!("Failed to save moderation history: {}", e);
        }
    }

    fn backup(&self, now: DateTime<Utc>) {
        if let Some(backups) = &self.backups {
            if let Err(e) = backups.create(&self.snapshot(), now) {
                error!("Failed to create backup: {}", e);
            }
        }
    }

    fn sweep_backups_logged(&self, now: DateTime<Utc>) {
        if let Err(e) = self.sweep_backups(now) {
            error!("Failed to sweep backups: {}", e);
        }
    }
}
