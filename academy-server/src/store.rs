//! SQLite persistence for lesson completion and quiz attempts.

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use sqlx::FromRow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("failed to encode quiz answers: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Completion state of one lesson
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LessonRecord {
    /// Lesson id, `"<module_id>::<slug>"`
    pub id: String,
    pub module_id: String,
    pub lesson_slug: String,
    /// 1 when complete, 0 otherwise
    pub completed: i64,
    /// RFC 3339 timestamp of the last completion
    pub completed_at: Option<String>,
    pub notes: Option<String>,
}

impl LessonRecord {
    pub fn is_completed(&self) -> bool {
        self.completed != 0
    }
}

/// One graded quiz submission
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: String,
    /// Number of correct answers
    pub score: i64,
    pub total: i64,
    pub answers_json: String,
    pub attempted_at: String,
}

/// Handle to the progress database. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    pool: SqlitePool,
}

impl ProgressStore {
    /// Open (creating if missing) the database at `path` and apply the schema
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self { pool };
        store.init().await?;
        tracing::debug!("Opened progress database at {}", path.display());
        Ok(store)
    }

    /// Create tables if they don't exist
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS lessons (
                id TEXT PRIMARY KEY,
                module_id TEXT NOT NULL,
                lesson_slug TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                notes TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id TEXT NOT NULL,
                score INTEGER NOT NULL,
                total INTEGER NOT NULL,
                answers_json TEXT NOT NULL,
                attempted_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_lessons_module ON lessons(module_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn mark_complete(&self, lesson_id: &str, module_id: &str, slug: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO lessons (id, module_id, lesson_slug, completed, completed_at)
            VALUES (?, ?, ?, 1, ?)
            ON CONFLICT(id) DO UPDATE SET completed = 1, completed_at = excluded.completed_at
            "#,
        )
        .bind(lesson_id)
        .bind(module_id)
        .bind(slug)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_incomplete(&self, lesson_id: &str, module_id: &str, slug: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO lessons (id, module_id, lesson_slug, completed, completed_at)
            VALUES (?, ?, ?, 0, NULL)
            ON CONFLICT(id) DO UPDATE SET completed = 0, completed_at = NULL
            "#,
        )
        .bind(lesson_id)
        .bind(module_id)
        .bind(slug)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Every lesson record, keyed by lesson id
    pub async fn progress(&self) -> Result<BTreeMap<String, LessonRecord>> {
        let rows = sqlx::query_as::<_, LessonRecord>(
            "SELECT id, module_id, lesson_slug, completed, completed_at, notes FROM lessons",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| (r.id.clone(), r)).collect())
    }

    /// Lesson records of one module, keyed by lesson id
    pub async fn module_progress(&self, module_id: &str) -> Result<BTreeMap<String, LessonRecord>> {
        let rows = sqlx::query_as::<_, LessonRecord>(
            r#"
            SELECT id, module_id, lesson_slug, completed, completed_at, notes
            FROM lessons
            WHERE module_id = ?
            "#,
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| (r.id.clone(), r)).collect())
    }

    /// Ids of the lessons currently marked complete
    pub async fn completed_ids(&self) -> Result<HashSet<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM lessons WHERE completed != 0")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn save_quiz_attempt(
        &self,
        quiz_id: &str,
        score: usize,
        total: usize,
        answers: &HashMap<String, String>,
    ) -> Result<i64> {
        // Sorted keys keep the stored JSON stable
        let answers: BTreeMap<&String, &String> = answers.iter().collect();
        let answers_json = serde_json::to_string(&answers)?;
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO quiz_attempts (quiz_id, score, total, answers_json, attempted_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(quiz_id)
        .bind(score as i64)
        .bind(total as i64)
        .bind(answers_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Highest-scoring attempt; among equal scores the most recent wins
    pub async fn quiz_best(&self, quiz_id: &str) -> Result<Option<QuizAttempt>> {
        let best = sqlx::query_as::<_, QuizAttempt>(
            r#"
            SELECT id, quiz_id, score, total, answers_json, attempted_at
            FROM quiz_attempts
            WHERE quiz_id = ?
            ORDER BY score DESC, attempted_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(best)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, ProgressStore) {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::open(&dir.path().join("nested/progress.db"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_toggle_completion() {
        let (_dir, store) = store().await;

        store.mark_complete("a::x", "a", "x").await.unwrap();
        store.mark_complete("b::z", "b", "z").await.unwrap();

        let all = store.progress().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all["a::x"].is_completed());
        assert!(all["a::x"].completed_at.is_some());

        store.mark_incomplete("a::x", "a", "x").await.unwrap();
        let module = store.module_progress("a").await.unwrap();
        assert_eq!(module.len(), 1);
        assert!(!module["a::x"].is_completed());
        assert!(module["a::x"].completed_at.is_none());

        assert_eq!(
            store.completed_ids().await.unwrap(),
            HashSet::from(["b::z".to_string()])
        );
        store.close().await;
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let (_dir, store) = store().await;
        store.mark_complete("a::x", "a", "x").await.unwrap();
        store.init().await.unwrap();
        assert_eq!(store.progress().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quiz_best_prefers_score_then_recency() {
        let (_dir, store) = store().await;
        assert!(store.quiz_best("q").await.unwrap().is_none());

        let answers = HashMap::from([("q1".to_string(), "a".to_string())]);
        store.save_quiz_attempt("q", 1, 3, &answers).await.unwrap();
        let high = store.save_quiz_attempt("q", 3, 3, &answers).await.unwrap();
        store.save_quiz_attempt("q", 2, 3, &answers).await.unwrap();
        let best = store.quiz_best("q").await.unwrap().unwrap();
        assert_eq!(best.id, high);
        assert_eq!(best.score, 3);
        assert_eq!(best.answers_json, r#"{"q1":"a"}"#);

        let tie = store.save_quiz_attempt("q", 3, 3, &answers).await.unwrap();
        assert_eq!(store.quiz_best("q").await.unwrap().unwrap().id, tie);
        assert!(store.quiz_best("other").await.unwrap().is_none());
    }
}
