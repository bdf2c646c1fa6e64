//! Timestamped leaderboard backups
//!
//! A backup is a full copy of the players snapshot written to
//! `backups/leaderboard_YYYYMMDD_HHMMSS.json`. Backups older than the retention
//! window are deleted by [`BackupManager::sweep`].

use crate::leaderboard::LeaderboardFile;
use crate::storage::{JsonFile, SnapshotStore};
use crate::time;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use tracing::{debug, info};

const PREFIX: &str = "leaderboard_";
const SUFFIX: &str = ".json";

/// One backup file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub filename: String,
    pub taken_at: DateTime<Utc>,
}

pub struct BackupManager {
    dir: PathBuf,
    retention: Duration,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            dir: dir.into(),
            retention,
        }
    }

    pub fn filename_for(at: DateTime<Utc>) -> String {
        format!("{}{}{}", PREFIX, time::backup_stamp(at), SUFFIX)
    }

    /// Write `snapshot` as the backup for instant `at`
    pub fn create(&self, snapshot: &LeaderboardFile, at: DateTime<Utc>) -> Result<String> {
        std::fs::create_dir_all(&self.dir)?;
        let filename = Self::filename_for(at);
        JsonFile::new(self.dir.join(&filename)).save_all(snapshot)?;
        info!("Backup created: {}", filename);
        Ok(filename)
    }

    /// Every backup file, oldest first
    pub fn list(&self) -> Result<Vec<BackupInfo>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut backups = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let filename = entry?.file_name().to_string_lossy().into_owned();
            if let Some(taken_at) = parse_filename(&filename) {
                backups.push(BackupInfo { filename, taken_at });
            }
        }
        backups.sort_by(|a, b| a.taken_at.cmp(&b.taken_at));
        Ok(backups)
    }

    /// Delete backups older than the retention window; returns removed names
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for backup in self.list()? {
            if now - backup.taken_at > self.retention {
                std::fs::remove_file(self.dir.join(&backup.filename))?;
                info!("Expired backup removed: {}", backup.filename);
                removed.push(backup.filename);
            }
        }
        debug!("Backup sweep removed {} file(s)", removed.len());
        Ok(removed)
    }

    /// Read back the snapshot stored in `filename`
    pub fn load(&self, filename: &str) -> Result<LeaderboardFile> {
        if parse_filename(filename).is_none() {
            return Err(Error::InvalidInput(format!("not a backup file name: {}", filename)));
        }
        JsonFile::<LeaderboardFile>::new(self.dir.join(filename))
            .load()?
            .ok_or_else(|| Error::NotFound(format!("backup {}", filename)))
    }
}

/// Timestamp embedded in a backup file name; `None` for anything else
fn parse_filename(filename: &str) -> Option<DateTime<Utc>> {
    let stamp = filename.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    time::parse_backup_stamp(stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap() + Duration::hours(h as i64)
    }

    #[test]
    fn test_create_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), Duration::hours(24));
        manager.create(&LeaderboardFile::default(), at(2)).unwrap();
        manager.create(&LeaderboardFile::default(), at(1)).unwrap();
        std::fs::write(dir.path().join("backups").join("notes.txt"), "x").unwrap();

        let listed = manager.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].taken_at, at(1));
        assert_eq!(listed[1].filename, BackupManager::filename_for(at(2)));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(dir.path(), Duration::hours(24));
        manager.create(&LeaderboardFile::default(), at(0)).unwrap();
        manager.create(&LeaderboardFile::default(), at(10)).unwrap();

        let removed = manager.sweep(at(30)).unwrap();
        assert_eq!(removed, vec![BackupManager::filename_for(at(0))]);
        assert_eq!(manager.list().unwrap().len(), 1);
    }

    #[test]
    fn test_load_rejects_foreign_names() {
        let dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(dir.path(), Duration::hours(24));
        assert!(matches!(manager.load("../leaderboard.json"), Err(Error::InvalidInput(_))));
        assert!(matches!(
            manager.load(&BackupManager::filename_for(at(3))),
            Err(Error::NotFound(_))
        ));
    }
}
