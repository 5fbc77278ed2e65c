//! Repository pattern for database access.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::error::DbError;
use srs_core::store::{AccessControl, CardCatalog, ProgressStore, SessionStore, StudyStore};
use srs_core::{CardId, CardScheduleState, DeckId, SessionId, StudySession, UserId};

type Result<T> = std::result::Result<T, DbError>;

/// Registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckRecord {
    pub id: DeckId,
    pub owner_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Deck with its card count, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckSummary {
    pub id: DeckId,
    pub name: String,
    pub card_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    pub deck_id: DeckId,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCard {
    pub question: String,
    pub answer: String,
}

/// SQLite implementation of the study store.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        Ok(())
    }

    /// Create a user with a generated token.
    pub fn create_user(&self, name: Option<&str>) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            token: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO users (id, name, token, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.name,
                user.token,
                user.created_at.to_rfc3339()
            ],
        )?;
        Ok(user)
    }

    pub fn user_exists(&self, user_id: UserId) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1",
                params![user_id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn user_by_token(&self, token: &str) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, token, created_at FROM users WHERE token = ?1",
                params![token],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, token, created_at)| {
            Ok(User {
                id: parse_uuid(&id)?,
                name,
                token,
                created_at: parse_datetime(&created_at)?,
            })
        })
        .transpose()
    }

    /// Create a deck owned by `owner_id`, insert its cards in order and
    /// grant the owner access.
    pub fn create_deck(&self, owner_id: UserId, name: &str, cards: &[NewCard]) -> Result<DeckRecord> {
        let tx = self.conn.unchecked_transaction()?;
        let created_at = Utc::now();
        tx.execute(
            "INSERT INTO decks (owner_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![owner_id.to_string(), name, created_at.to_rfc3339()],
        )?;
        let deck_id = tx.last_insert_rowid();

        for (position, card) in cards.iter().enumerate() {
            tx.execute(
                "INSERT INTO cards (deck_id, position, question_text, answer_text) VALUES (?1, ?2, ?3, ?4)",
                params![deck_id, position as i64, card.question, card.answer],
            )?;
        }
        tx.execute(
            "INSERT OR IGNORE INTO deck_access (user_id, deck_id) VALUES (?1, ?2)",
            params![owner_id.to_string(), deck_id],
        )?;
        tx.commit()?;

        Ok(DeckRecord {
            id: deck_id,
            owner_id,
            name: name.to_string(),
            created_at,
        })
    }

    pub fn deck(&self, deck_id: DeckId) -> Result<Option<DeckRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, owner_id, name, created_at FROM decks WHERE id = ?1",
                params![deck_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, owner_id, name, created_at)| {
            Ok(DeckRecord {
                id,
                owner_id: parse_uuid(&owner_id)?,
                name,
                created_at: parse_datetime(&created_at)?,
            })
        })
        .transpose()
    }

    /// Decks the user can access.
    pub fn decks_for_user(&self, user_id: UserId) -> Result<Vec<DeckSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.name, (SELECT COUNT(*) FROM cards c WHERE c.deck_id = d.id)
             FROM decks d JOIN deck_access a ON a.deck_id = d.id
             WHERE a.user_id = ?1 ORDER BY d.id",
        )?;

        let decks = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(DeckSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    card_count: row.get::<_, i64>(2)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(decks)
    }

    pub fn cards(&self, deck_id: DeckId) -> Result<Vec<CardRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, deck_id, question_text, answer_text FROM cards WHERE deck_id = ?1 ORDER BY position, id",
        )?;

        let cards = stmt
            .query_map(params![deck_id], |row| {
                Ok(CardRecord {
                    id: row.get(0)?,
                    deck_id: row.get(1)?,
                    question: row.get(2)?,
                    answer: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    pub fn grant_access(&self, user_id: UserId, deck_id: DeckId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO deck_access (user_id, deck_id) VALUES (?1, ?2)",
            params![user_id.to_string(), deck_id],
        )?;
        Ok(())
    }

    fn card_ids(&self, deck_id: DeckId) -> Result<Vec<CardId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM cards WHERE deck_id = ?1 ORDER BY position, id")?;
        let ids = stmt
            .query_map(params![deck_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn has_access(&self, user_id: UserId, deck_id: DeckId) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM deck_access WHERE user_id = ?1 AND deck_id = ?2",
                params![user_id.to_string(), deck_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn card_state(&self, user_id: UserId, card_id: CardId) -> Result<Option<CardScheduleState>> {
        let row = self
            .conn
            .query_row(
                "SELECT ease_factor, interval_days, repetitions, next_review_at, quality_history,
                        times_studied, last_studied_at, first_studied_at
                 FROM card_states WHERE user_id = ?1 AND card_id = ?2",
                params![user_id.to_string(), card_id],
                StateRow::from_row,
            )
            .optional()?;
        row.map(StateRow::into_state).transpose()
    }

    fn session(&self, session_id: SessionId) -> Result<Option<StudySession>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM study_sessions WHERE id = ?1",
                params![session_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(data.map(|d| serde_json::from_str(&d)).transpose()?)
    }

    fn user_sessions(&self, user_id: UserId) -> Result<Vec<StudySession>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM study_sessions WHERE user_id = ?1 ORDER BY started_at")?;
        let rows = stmt
            .query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(DbError::from))
            .collect()
    }
}

/// Upsert a card state.
fn write_state(
    conn: &Connection,
    user_id: UserId,
    card_id: CardId,
    state: &CardScheduleState,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO card_states
            (user_id, card_id, ease_factor, interval_days, repetitions, next_review_at,
             quality_history, times_studied, last_studied_at, first_studied_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user_id.to_string(),
            card_id,
            state.ease_factor,
            state.interval_days,
            state.repetitions,
            state.next_review_at.map(|d| d.to_rfc3339()),
            serde_json::to_string(&state.quality_history)?,
            state.times_studied,
            state.last_studied_at.map(|d| d.to_rfc3339()),
            state.first_studied_at.map(|d| d.to_rfc3339()),
        ],
    )?;
    Ok(())
}

/// Insert a new session or update the stored one if its version is exactly
/// one behind.
fn write_session(conn: &Connection, session: &StudySession) -> Result<()> {
    let data = serde_json::to_string(session)?;
    let id = session.id.to_string();
    let now = Utc::now().to_rfc3339();
    let version = session.version as i64;

    let changed = match session.version {
        0 => 0,
        1 => conn.execute(
            "INSERT OR IGNORE INTO study_sessions
                (id, user_id, deck_id, mode, status, version, started_at, updated_at, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                session.user_id.to_string(),
                session.deck_id,
                session.mode.as_str(),
                session.status.as_str(),
                version,
                session.started_at.to_rfc3339(),
                now,
                data,
            ],
        )?,
        _ => conn.execute(
            "UPDATE study_sessions SET status = ?1, version = ?2, updated_at = ?3, data = ?4
             WHERE id = ?5 AND version = ?6",
            params![session.status.as_str(), version, now, data, id, version - 1],
        )?,
    };

    if changed == 0 {
        let stored: Option<i64> = conn
            .query_row(
                "SELECT version FROM study_sessions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        return Err(DbError::StaleSession {
            session_id: session.id,
            expected: stored.map_or(1, |v| v as u64 + 1),
        });
    }
    Ok(())
}

struct StateRow {
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
    next_review_at: Option<String>,
    quality_history: String,
    times_studied: u32,
    last_studied_at: Option<String>,
    first_studied_at: Option<String>,
}

impl StateRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ease_factor: row.get(0)?,
            interval_days: row.get(1)?,
            repetitions: row.get(2)?,
            next_review_at: row.get(3)?,
            quality_history: row.get(4)?,
            times_studied: row.get(5)?,
            last_studied_at: row.get(6)?,
            first_studied_at: row.get(7)?,
        })
    }

    fn into_state(self) -> Result<CardScheduleState> {
        Ok(CardScheduleState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
            next_review_at: parse_optional_datetime(self.next_review_at)?,
            quality_history: serde_json::from_str(&self.quality_history)?,
            times_studied: self.times_studied,
            last_studied_at: parse_optional_datetime(self.last_studied_at)?,
            first_studied_at: parse_optional_datetime(self.first_studied_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidData(format!("timestamp {s:?}: {e}")))
}

fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_datetime).transpose()
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::InvalidData(format!("uuid {s:?}: {e}")))
}

impl CardCatalog for SqliteRepository {
    fn cards_for_deck(&self, deck_id: DeckId) -> srs_core::Result<Vec<CardId>> {
        Ok(self.card_ids(deck_id)?)
    }
}

impl AccessControl for SqliteRepository {
    fn can_access_deck(&self, user_id: UserId, deck_id: DeckId) -> srs_core::Result<bool> {
        Ok(self.has_access(user_id, deck_id)?)
    }
}

impl ProgressStore for SqliteRepository {
    fn load_state(
        &self,
        user_id: UserId,
        card_id: CardId,
    ) -> srs_core::Result<Option<CardScheduleState>> {
        Ok(self.card_state(user_id, card_id)?)
    }

    fn save_state(
        &self,
        user_id: UserId,
        card_id: CardId,
        state: &CardScheduleState,
    ) -> srs_core::Result<()> {
        Ok(write_state(&self.conn, user_id, card_id, state)?)
    }
}

impl SessionStore for SqliteRepository {
    fn load_session(&self, session_id: SessionId) -> srs_core::Result<Option<StudySession>> {
        Ok(self.session(session_id)?)
    }

    fn save_session(&self, session: &StudySession) -> srs_core::Result<()> {
        Ok(write_session(&self.conn, session)?)
    }

    fn sessions_for_user(&self, user_id: UserId) -> srs_core::Result<Vec<StudySession>> {
        Ok(self.user_sessions(user_id)?)
    }
}

impl StudyStore for SqliteRepository {
    fn commit_answer(
        &self,
        user_id: UserId,
        card_id: CardId,
        state: &CardScheduleState,
        session: &StudySession,
    ) -> srs_core::Result<()> {
        let commit = || -> Result<()> {
            let tx = self.conn.unchecked_transaction()?;
            write_session(&tx, session)?;
            write_state(&tx, user_id, card_id, state)?;
            tx.commit()?;
            Ok(())
        };
        Ok(commit()?)
    }
}
