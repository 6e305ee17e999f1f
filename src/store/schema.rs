//! SQLite schema for the progress database

/// Current schema version written to `schema_version`
pub const SCHEMA_VERSION: i32 = 2;

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- One row per learner; running aggregate stored as JSON
CREATE TABLE IF NOT EXISTS learners (
    user_id TEXT PRIMARY KEY,
    progress TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Session log, kept in insertion order via seq
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES learners(user_id) ON DELETE CASCADE,
    seq INTEGER NOT NULL,
    mode TEXT NOT NULL,
    age_year INTEGER NOT NULL,
    date TEXT NOT NULL,
    record TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, seq);

CREATE TABLE IF NOT EXISTS yearly_progress (
    user_id TEXT NOT NULL REFERENCES learners(user_id) ON DELETE CASCADE,
    age_year INTEGER NOT NULL,
    status TEXT NOT NULL,
    record TEXT NOT NULL,
    PRIMARY KEY (user_id, age_year)
);

CREATE TABLE IF NOT EXISTS completions (
    user_id TEXT NOT NULL REFERENCES learners(user_id) ON DELETE CASCADE,
    mode TEXT NOT NULL,
    age_year INTEGER NOT NULL,
    record TEXT NOT NULL,
    PRIMARY KEY (user_id, mode, age_year)
);
"#;

/// Migration 2: graduation audit trail and badges
pub const MIGRATION_2_SQL: &str = r#"
-- Insert-only; one record per graduated year
CREATE TABLE IF NOT EXISTS graduation_history (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES learners(user_id) ON DELETE CASCADE,
    from_age INTEGER NOT NULL,
    to_age INTEGER NOT NULL,
    graduated_at TEXT NOT NULL,
    record TEXT NOT NULL,
    UNIQUE (user_id, from_age)
);

CREATE TABLE IF NOT EXISTS user_badges (
    user_id TEXT NOT NULL REFERENCES learners(user_id) ON DELETE CASCADE,
    badge_id TEXT NOT NULL,
    earned_at TEXT NOT NULL,
    PRIMARY KEY (user_id, badge_id)
);
"#;
