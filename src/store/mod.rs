//! SQLite persistence for learner state
//!
//! Manages the `~/.tinysteps/progress.db` database. Each save writes a whole
//! `LearnerState` snapshot inside one transaction; graduation history and
//! badges are only ever inserted.

mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::engine::LearnerState;
use crate::graduation::YearLedger;
use crate::progress::{
    AgeVariantCompletion, GraduationHistory, Progress, SessionHistory, SessionRecord, UserBadge,
    YearlyProgress,
};

use schema::{MIGRATION_2_SQL, SCHEMA_SQL, SCHEMA_VERSION};

/// Progress database handle
#[derive(Clone)]
pub struct ProgressStore {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressStore {
    /// Open or create the database at the default location (~/.tinysteps/progress.db)
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_path())
    }

    pub fn default_path() -> std::path::PathBuf {
        Config::global_config_dir().join("progress.db")
    }

    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progress db: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Lock the connection. Writes for a learner are serialized here.
    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Progress DB lock poisoned")
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        if version < 1 {
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (1)", [])?;
        }

        // Migration 2: graduation history and badges
        if version < 2 {
            conn.execute_batch(MIGRATION_2_SQL)?;
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        debug!("Progress schema at version {}", SCHEMA_VERSION);
        Ok(())
    }

    /// Create a learner at `age`. Fails if the learner already exists.
    pub fn create_learner(&self, user_id: &str, age: u8, now: DateTime<Utc>) -> Result<LearnerState> {
        if self.learner_exists(user_id)? {
            bail!("Learner '{}' already exists", user_id);
        }
        let state = LearnerState::enroll(user_id, age, now);
        self.save_learner(&state, now)?;
        Ok(state)
    }

    pub fn learner_exists(&self, user_id: &str) -> Result<bool> {
        let conn = self.conn();
        let found: Option<String> = conn
            .query_row(
                "SELECT user_id FROM learners WHERE user_id = ?1",
                [user_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All learner IDs, sorted
    pub fn list_learners(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT user_id FROM learners ORDER BY user_id")?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    /// Load a learner snapshot, or `None` if the learner is unknown
    pub fn load_learner(&self, user_id: &str) -> Result<Option<LearnerState>> {
        let conn = self.conn();

        let progress: Option<String> = conn
            .query_row(
                "SELECT progress FROM learners WHERE user_id = ?1",
                [user_id],
                |r| r.get(0),
            )
            .optional()?;
        let Some(progress) = progress else {
            return Ok(None);
        };
        let progress: Progress = parse_json(&progress, "progress")?;

        let sessions: Vec<SessionRecord> = load_records(
            &conn,
            "SELECT record FROM sessions WHERE user_id = ?1 ORDER BY seq",
            user_id,
        )?;
        let years: Vec<YearlyProgress> = load_records(
            &conn,
            "SELECT record FROM yearly_progress WHERE user_id = ?1 ORDER BY age_year",
            user_id,
        )?;
        let history: Vec<GraduationHistory> = load_records(
            &conn,
            "SELECT record FROM graduation_history WHERE user_id = ?1 ORDER BY from_age",
            user_id,
        )?;
        let completions: Vec<AgeVariantCompletion> = load_records(
            &conn,
            "SELECT record FROM completions WHERE user_id = ?1 ORDER BY age_year, mode",
            user_id,
        )?;

        let mut stmt = conn.prepare(
            "SELECT badge_id, earned_at FROM user_badges WHERE user_id = ?1 ORDER BY earned_at, badge_id",
        )?;
        let badges = stmt
            .query_map([user_id], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
            .map(|row| -> Result<UserBadge> {
                let (badge_id, earned_at) = row?;
                let earned_at = DateTime::parse_from_rfc3339(&earned_at)
                    .with_context(|| format!("Invalid earned_at for badge {}", badge_id))?
                    .with_timezone(&Utc);
                Ok(UserBadge {
                    user_id: user_id.to_string(),
                    badge_id,
                    earned_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let years = YearLedger::from_parts(years, history)
            .with_context(|| format!("Corrupt year records for learner '{}'", user_id))?;

        Ok(Some(LearnerState {
            user_id: user_id.to_string(),
            progress,
            sessions: SessionHistory::from_records(sessions),
            years,
            completions,
            badges,
        }))
    }

    /// Persist a learner snapshot
    pub fn save_learner(&self, state: &LearnerState, now: DateTime<Utc>) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let user = state.user_id.as_str();
        let now = now.to_rfc3339();

        // Merge with what is on disk so a stale snapshot can't roll counters back
        let stored: Option<String> = tx
            .query_row(
                "SELECT progress FROM learners WHERE user_id = ?1",
                [user],
                |r| r.get(0),
            )
            .optional()?;
        let mut progress = state.progress.clone();
        if let Some(raw) = stored {
            progress.merge(&parse_json::<Progress>(&raw, "progress")?);
        }

        tx.execute(
            r#"INSERT INTO learners (user_id, progress, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?3)
               ON CONFLICT(user_id) DO UPDATE SET progress = excluded.progress,
                                                  updated_at = excluded.updated_at"#,
            params![user, serde_json::to_string(&progress)?, now],
        )?;

        // The log is pruned in memory, so rewrite it wholesale
        tx.execute("DELETE FROM sessions WHERE user_id = ?1", [user])?;
        for (seq, record) in state.sessions.records().iter().enumerate() {
            tx.execute(
                r#"INSERT INTO sessions (id, user_id, seq, mode, age_year, date, record)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                params![
                    record.id.to_string(),
                    user,
                    seq as i64,
                    record.mode,
                    record.age_year,
                    record.date.to_rfc3339(),
                    serde_json::to_string(record)?,
                ],
            )?;
        }

        for yearly in state.years.years() {
            tx.execute(
                r#"INSERT OR REPLACE INTO yearly_progress (user_id, age_year, status, record)
                   VALUES (?1, ?2, ?3, ?4)"#,
                params![
                    user,
                    yearly.age_year,
                    yearly.graduation_status.as_str(),
                    serde_json::to_string(yearly)?,
                ],
            )?;
        }

        for completion in &state.completions {
            tx.execute(
                r#"INSERT OR REPLACE INTO completions (user_id, mode, age_year, record)
                   VALUES (?1, ?2, ?3, ?4)"#,
                params![
                    user,
                    completion.mode,
                    completion.age_year,
                    serde_json::to_string(completion)?,
                ],
            )?;
        }

        for record in state.years.history() {
            tx.execute(
                r#"INSERT OR IGNORE INTO graduation_history
                   (id, user_id, from_age, to_age, graduated_at, record)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                params![
                    record.id.to_string(),
                    user,
                    record.from_age,
                    record.to_age,
                    record.graduated_at.to_rfc3339(),
                    serde_json::to_string(record)?,
                ],
            )?;
        }

        for badge in &state.badges {
            tx.execute(
                "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at) VALUES (?1, ?2, ?3)",
                params![user, badge.badge_id, badge.earned_at.to_rfc3339()],
            )?;
        }

        tx.commit()?;
        debug!("Saved learner {}", user);
        Ok(())
    }

    /// Number of graduation records stored for a learner
    pub fn graduation_count(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM graduation_history WHERE user_id = ?1",
            [user_id],
            |r| r.get(0),
        )?;
        Ok(count as u64)
    }
}

fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T> {
    serde_json::from_str(raw).with_context(|| format!("Invalid stored {}", what))
}

fn load_records<T: DeserializeOwned>(conn: &Connection, sql: &str, user_id: &str) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([user_id], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    rows.iter().map(|raw| parse_json(raw, "record")).collect()
}
