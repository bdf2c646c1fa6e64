//! Leaderboard persistence against a real data folder

use chrono::{Duration, TimeZone, Utc};
use vvv_core::config::DataDir;
use vvv_core::confirmation::{self, ConfirmationSessions, FlowOutcome};
use vvv_core::duplicates::detect_duplicates;
use vvv_core::{parse_quiz_text, LeaderboardStore};

fn open(dir: &tempfile::TempDir) -> (DataDir, LeaderboardStore) {
    let data_dir = DataDir::new(dir.path().to_path_buf());
    data_dir.ensure_exists().unwrap();
    let store = LeaderboardStore::open(&data_dir, Duration::hours(24));
    (data_dir, store)
}

#[test]
fn test_confirmed_quiz_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (data_dir, mut store) = open(&dir);
    let mut sessions = ConfirmationSessions::new();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 21, 30, 0).unwrap();

    let report = parse_quiz_text("MODO: ALICE 200\nBOB 50\nCHARLIE -30", store.identity());
    confirmation::begin_quiz(&mut sessions, report, "admin", "g1", now).unwrap();
    confirmation::handle_reply(&mut sessions, &mut store, "admin", "g1", "OUI", now);
    let outcome = confirmation::handle_reply(&mut sessions, &mut store, "admin", "g1", "200", now);
    assert!(matches!(outcome, FlowOutcome::Committed(_)));

    let (_, reopened) = open(&dir);
    assert_eq!(reopened.find_player("ALICE").unwrap().points, 200);
    assert_eq!(reopened.find_player("BOB").unwrap().points, 50);
    assert_eq!(reopened.find_player("CHARLIE").unwrap().points, -30);
    assert_eq!(reopened.find_player("ALICE").unwrap().rank, 1);
    assert_eq!(reopened.history().len(), 1);
    assert_eq!(reopened.history()[0].quiz_id, "QUIZ-01213000");
    assert_eq!(reopened.history()[0].date, "01/06/2025");

    let backups = reopened.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].filename, "leaderboard_20250601_213000.json");

    let raw = std::fs::read_to_string(data_dir.leaderboard_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &json["players"][0];
    assert_eq!(first["name"], "ALICE");
    assert!(first["joinDate"].is_string());
    assert_eq!(first["category"]["name"], "LA PARESSE");

    let history: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(data_dir.history_path()).unwrap()).unwrap();
    assert_eq!(history[0]["modo"], "ALICE");
    assert_eq!(history[0]["quizId"], "QUIZ-01213000");
}

#[test]
fn test_merge_memory_is_applied_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (_, mut store) = open(&dir);
    store.apply_delta("RYOMEN", 1000);
    store.apply_delta("RYOMEN SK", 990);

    let groups = detect_duplicates(store.players());
    assert_eq!(groups.len(), 1);
    let principal = groups[0].principal().unwrap().name.clone();
    assert_eq!(principal, "RYOMEN");

    store.merge_players("RYOMEN SK", &principal).unwrap();
    drop(store);

    let (_, reopened) = open(&dir);
    assert_eq!(reopened.find_player("RYOMEN").unwrap().points, 1990);
    let report = parse_quiz_text("MODO : ZED\nryomen sk 10", reopened.identity());
    assert_eq!(report.participants[0].raw_name, "ryomen sk");
    assert_eq!(report.participants[0].resolved_name, "RYOMEN");
}

#[test]
fn test_restore_backup_and_retention_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let (_, mut store) = open(&dir);
    let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();

    let entries = vvv_core::parse_standings_text("1- 5,000 SYD\n2- 100 BOB");
    store.replace_standings(&entries, t0);
    let first_backup = store.list_backups().unwrap()[0].filename.clone();

    let report = parse_quiz_text("MODO: KIRA 10\nBOB 900", store.identity());
    store.commit_quiz(&report, "QUIZ-X", "01/06/2025", t0 + Duration::hours(1));
    assert_eq!(store.find_player("BOB").unwrap().points, 1000);
    assert_eq!(store.list_backups().unwrap().len(), 2);

    assert_eq!(store.restore_backup(&first_backup).unwrap(), 2);
    assert_eq!(store.find_player("BOB").unwrap().points, 100);
    assert!(store.find_player("KIRA").is_none());

    let removed = store.sweep_backups(t0 + Duration::hours(24) + Duration::minutes(30)).unwrap();
    assert_eq!(removed, vec![first_backup]);
    assert_eq!(store.list_backups().unwrap().len(), 1);
}

#[test]
fn test_corrupt_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = DataDir::new(dir.path().to_path_buf());
    data_dir.ensure_exists().unwrap();
    std::fs::write(data_dir.leaderboard_path(), "{ not json").unwrap();

    let store = LeaderboardStore::open(&data_dir, Duration::hours(24));
    assert!(store.players().is_empty());
}
