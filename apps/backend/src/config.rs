//! Server configuration from the environment.

use std::str::FromStr;

use anyhow::Context;
use srs_core::{FailureEase, StudySettings};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite file, or `:memory:`.
    pub database_path: String,
    pub study: StudySettings,
}

impl Config {
    /// Read `HOST`, `PORT`, `DATABASE_PATH` and the `SRS_*` study overrides.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = StudySettings::default();

        let failure_ease = match lookup("SRS_FAILURE_EASE").as_deref() {
            None => defaults.failure_ease,
            Some("formula") => FailureEase::Formula,
            Some(penalty) => FailureEase::Penalty(
                penalty
                    .parse()
                    .with_context(|| format!("SRS_FAILURE_EASE: invalid value {penalty:?}"))?,
            ),
        };

        let study = StudySettings {
            review_limit: parse_var(&lookup, "SRS_REVIEW_LIMIT", defaults.review_limit)?,
            learn_batch_size: parse_var(
                &lookup,
                "SRS_LEARN_BATCH_SIZE",
                defaults.learn_batch_size,
            )?,
            mastery_threshold: parse_var(
                &lookup,
                "SRS_MASTERY_THRESHOLD",
                defaults.mastery_threshold,
            )?,
            requeue_gap: parse_var(&lookup, "SRS_REQUEUE_GAP", defaults.requeue_gap)?,
            streak_bonus_every: parse_var(
                &lookup,
                "SRS_STREAK_BONUS_EVERY",
                defaults.streak_bonus_every,
            )?,
            cram_rounds: parse_var(&lookup, "SRS_CRAM_ROUNDS", defaults.cram_rounds)?,
            cram_fast_ms: parse_var(&lookup, "SRS_CRAM_FAST_MS", defaults.cram_fast_ms)?,
            break_reminders_enabled: parse_var(
                &lookup,
                "SRS_BREAK_REMINDERS",
                defaults.break_reminders_enabled,
            )?,
            break_interval_minutes: parse_var(
                &lookup,
                "SRS_BREAK_INTERVAL_MINUTES",
                defaults.break_interval_minutes,
            )?,
            failure_ease,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 3000)?,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "srs.db".to_string()),
            study,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key}: invalid value {raw:?}")),
        None => Ok(default),
    }
}
