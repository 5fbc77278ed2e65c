//! SQLite storage behind the study engine.

pub mod error;
pub mod repository;
pub mod schema;

pub use error::DbError;
pub use repository::{CardRecord, DeckRecord, DeckSummary, NewCard, SqliteRepository, User};
