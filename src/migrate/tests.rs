//! Unit tests for the migration runner.

use super::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

// ============================================================================
// Test doubles
// ============================================================================

/// In-memory ledger that fails statements containing marker words.
#[derive(Default)]
struct FakeStore {
    ledger: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
    releases: AtomicUsize,
}

impl FakeStore {
    fn with_applied(names: &[&str]) -> Self {
        let store = Self::default();
        store
            .ledger
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| n.to_string()));
        store
    }

    fn ledger(&self) -> Vec<String> {
        self.ledger.lock().unwrap().clone()
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MigrationStore for FakeStore {
    async fn ensure_ledger(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn applied_migrations(&self) -> Result<Vec<String>, DbError> {
        Ok(self.ledger())
    }

    async fn execute(&self, statement: &str) -> Result<(), DbError> {
        if statement.contains("EXISTING") {
            return Err(DbError::AlreadyExists(
                "relation \"clients\" already exists".to_string(),
            ));
        }
        if statement.contains("BROKEN") {
            return Err(DbError::Query(sqlx::Error::Protocol(
                "syntax error".to_string(),
            )));
        }
        self.executed.lock().unwrap().push(statement.to_string());
        Ok(())
    }

    async fn record(&self, name: &str) -> Result<(), DbError> {
        self.ledger.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn record_if_absent(&self, name: &str) -> Result<(), DbError> {
        let mut ledger = self.ledger.lock().unwrap();
        if !ledger.iter().any(|n| n == name) {
            ledger.push(name.to_string());
        }
        Ok(())
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn migrations_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, sql) in files {
        std::fs::write(dir.path().join(name), sql).unwrap();
    }
    dir
}

// ============================================================================
// Runner
// ============================================================================

#[tokio::test]
async fn test_applies_pending_in_name_order() {
    let dir = migrations_dir(&[
        ("002_add_column.sql", "ALTER TABLE t ADD COLUMN c INT;"),
        ("001_init.sql", "CREATE TABLE t (id INT);"),
        ("notes.txt", "not a migration"),
    ]);
    let store = FakeStore::default();

    let report = MigrationRunner::new(dir.path()).run(&store).await.unwrap();

    assert_eq!(report.discovered, vec!["001_init.sql", "002_add_column.sql"]);
    assert_eq!(report.applied, vec!["001_init.sql", "002_add_column.sql"]);
    assert!(report.forced.is_empty());
    assert_eq!(store.ledger(), vec!["001_init.sql", "002_add_column.sql"]);
    assert_eq!(
        store.executed(),
        vec!["CREATE TABLE t (id INT)", "ALTER TABLE t ADD COLUMN c INT"]
    );
    assert_eq!(store.releases(), 1);
}

#[tokio::test]
async fn test_rerun_applies_nothing() {
    let dir = migrations_dir(&[
        ("001_init.sql", "CREATE TABLE t (id INT);"),
        ("002_add_column.sql", "ALTER TABLE t ADD COLUMN c INT;"),
    ]);
    let store = FakeStore::default();
    let runner = MigrationRunner::new(dir.path());

    runner.run(&store).await.unwrap();
    let second = runner.run(&store).await.unwrap();

    assert!(second.is_up_to_date());
    assert_eq!(store.executed().len(), 2);
    assert_eq!(store.ledger().len(), 2);
    assert_eq!(store.releases(), 2);
}

#[tokio::test]
async fn test_skips_already_recorded() {
    let dir = migrations_dir(&[
        ("001_init.sql", "CREATE TABLE t (id INT);"),
        ("002_add_column.sql", "ALTER TABLE t ADD COLUMN c INT;"),
    ]);
    let store = FakeStore::with_applied(&["001_init.sql"]);

    let report = MigrationRunner::new(dir.path()).run(&store).await.unwrap();

    assert_eq!(report.applied, vec!["002_add_column.sql"]);
    assert_eq!(store.executed(), vec!["ALTER TABLE t ADD COLUMN c INT"]);
}

#[tokio::test]
async fn test_already_exists_is_recorded_and_run_continues() {
    let dir = migrations_dir(&[
        ("001_init.sql", "CREATE TABLE EXISTING (id INT);"),
        ("002_add_column.sql", "ALTER TABLE t ADD COLUMN c INT;"),
    ]);
    let store = FakeStore::default();

    let report = MigrationRunner::new(dir.path()).run(&store).await.unwrap();

    assert_eq!(report.forced, vec!["001_init.sql"]);
    assert_eq!(report.applied, vec!["002_add_column.sql"]);
    assert_eq!(store.ledger(), vec!["001_init.sql", "002_add_column.sql"]);
}

#[tokio::test]
async fn test_failure_aborts_and_keeps_earlier_records() {
    let dir = migrations_dir(&[
        ("001_init.sql", "CREATE TABLE t (id INT);"),
        ("002_broken.sql", "BROKEN STATEMENT;"),
        ("003_later.sql", "CREATE INDEX idx ON t (id);"),
    ]);
    let store = FakeStore::default();

    let err = MigrationRunner::new(dir.path())
        .run(&store)
        .await
        .unwrap_err();

    match err {
        MigrationError::Execution { migration, .. } => assert_eq!(migration, "002_broken.sql"),
        other => panic!("expected execution error, got {other:?}"),
    }
    assert_eq!(store.ledger(), vec!["001_init.sql"]);
    assert_eq!(store.executed(), vec!["CREATE TABLE t (id INT)"]);
    assert_eq!(store.releases(), 1);
}

#[tokio::test]
async fn test_comment_only_migration_is_recorded() {
    let dir = migrations_dir(&[("001_noop.sql", "-- nothing to do yet\n")]);
    let store = FakeStore::default();

    let report = MigrationRunner::new(dir.path()).run(&store).await.unwrap();

    assert_eq!(report.applied, vec!["001_noop.sql"]);
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_missing_directory_is_created() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("migrations");
    let store = FakeStore::default();

    let report = MigrationRunner::new(&dir).run(&store).await.unwrap();

    assert!(dir.is_dir());
    assert!(report.discovered.is_empty());
    assert!(report.is_up_to_date());
    assert_eq!(store.releases(), 1);
}

// ============================================================================
// Statement splitting
// ============================================================================

#[test]
fn test_split_drops_empty_fragments() {
    let statements = split_statements("CREATE TABLE a (id INT);\n\n;  ;\nCREATE TABLE b (id INT);\n");
    assert_eq!(
        statements,
        vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]
    );
}

#[test]
fn test_split_strips_leading_comments() {
    let sql = "-- Create clients\n-- second line\nCREATE TABLE clients (id INT);\n-- trailing note\n";
    assert_eq!(split_statements(sql), vec!["CREATE TABLE clients (id INT)"]);
}

#[test]
fn test_split_keeps_inner_lines() {
    let sql = "CREATE TABLE t (\n  id INT,\n  name TEXT\n);";
    assert_eq!(
        split_statements(sql),
        vec!["CREATE TABLE t (\n  id INT,\n  name TEXT\n)"]
    );
}

#[test]
fn test_split_breaks_on_semicolon_inside_literal() {
    let statements = split_statements("INSERT INTO t VALUES ('a;b');");
    assert_eq!(statements.len(), 2);
}
