//! Spaced-repetition study engine shared by the backend.
//!
//! Provides:
//! - SM-2 scheduling of per-card review state
//! - Due card selection and review statistics
//! - Study modes (Review, Practice, Learn, Test, Cram) as session policies
//! - The study session state machine and answer processing
//! - Storage traits with an in-memory implementation

pub mod algorithm;
pub mod answer;
pub mod error;
pub mod manager;
pub mod policy;
pub mod selector;
pub mod session;
pub mod settings;
pub mod store;
pub mod summary;
pub mod types;

pub use algorithm::{FailureEase, SchedulingResult, Sm2, SpacedRepetitionAlgorithm};
pub use answer::{AnswerOutcome, AnswerProcessor};
pub use error::{Result, StudyError};
pub use manager::{DueCards, ProgressSnapshot, StartRequest, StudySessionManager};
pub use policy::{ModePolicy, ModeScore, ModeState};
pub use selector::{select_due, ReviewStats};
pub use session::{CardQueue, SessionCounters, SessionTargets, StudySession};
pub use settings::{SessionOptions, StudySettings};
pub use store::{AccessControl, CardCatalog, MemoryStore, ProgressStore, SessionStore, StudyStore};
pub use summary::{CompletionType, SessionSummary};
pub use types::{
    Answer, CardId, CardProgress, CardScheduleState, DeckId, Quality, SessionId, SessionStatus,
    StudyMode, UserId,
};
