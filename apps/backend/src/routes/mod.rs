pub mod auth;
pub mod decks;
pub mod sessions;
pub mod users;
