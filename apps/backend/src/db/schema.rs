//! SQLite schema definitions.

/// Complete schema for the study database.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- Users, resolved from bearer tokens
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT,
    token TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS decks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id TEXT NOT NULL REFERENCES users(id),
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Cards in deck order
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deck_id INTEGER NOT NULL REFERENCES decks(id),
    position INTEGER NOT NULL,
    question_text TEXT NOT NULL,
    answer_text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS deck_access (
    user_id TEXT NOT NULL REFERENCES users(id),
    deck_id INTEGER NOT NULL REFERENCES decks(id),
    PRIMARY KEY (user_id, deck_id)
);

-- Per-user scheduling state, created on first answer
CREATE TABLE IF NOT EXISTS card_states (
    user_id TEXT NOT NULL REFERENCES users(id),
    card_id INTEGER NOT NULL REFERENCES cards(id),
    ease_factor REAL NOT NULL,
    interval_days INTEGER NOT NULL,
    repetitions INTEGER NOT NULL,
    next_review_at TEXT,
    quality_history TEXT NOT NULL DEFAULT '[]',
    times_studied INTEGER NOT NULL DEFAULT 0,
    last_studied_at TEXT,
    first_studied_at TEXT,
    PRIMARY KEY (user_id, card_id)
);

-- Sessions are stored whole as JSON; the columns are for lookups
CREATE TABLE IF NOT EXISTS study_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    deck_id INTEGER NOT NULL REFERENCES decks(id),
    mode TEXT NOT NULL,
    status TEXT NOT NULL,
    version INTEGER NOT NULL,
    started_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    data TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id, position);
CREATE INDEX IF NOT EXISTS idx_card_states_due ON card_states(user_id, next_review_at);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON study_sessions(user_id, status);
"#;
