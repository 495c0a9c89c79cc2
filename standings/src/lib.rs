//! Standings - banking and ranking prediction scores
//!
//! Provides the I/O half of the prediction game on top of the pure
//! [`scoring`] crate:
//! - Injected repository traits for fields, answers, outcomes, the point
//!   ledger and the participant directory
//! - Readers that normalize stored rows into scoreable values
//! - The [`Reconciler`] batch that banks one prediction row per participant
//! - The [`LiveLeaderboard`] read path that recomputes prediction scores on
//!   every request and merges them with the other point sources
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//! │ FieldReader  │ │ AnswerReader │ │ OutcomeReader│
//! └──────┬───────┘ └──────┬───────┘ └──────┬───────┘
//!        └────────────────┼────────────────┘
//!                         ▼
//!                 scoring::score()
//!                 │              │
//!                 ▼              ▼
//!          ┌────────────┐  ┌────────────────┐
//!          │ Reconciler │  │ LiveLeaderboard│◄── other ledger sources
//!          │  (writes)  │  │    (reads)     │
//!          └────────────┘  └────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod leaderboard;
pub mod memory;
pub mod reader;
pub mod reconciler;
pub mod repository;

// Re-export main types
pub use config::{EngineConfig, TieBreak};
pub use error::{EngineError, StoreError};
pub use leaderboard::{LeaderboardReport, LeaderboardRow, LiveLeaderboard, OutcomeStats};
pub use memory::MemoryStore;
pub use reader::{AnswerReader, FieldReader, OutcomeReader, OutcomeSnapshot};
pub use reconciler::{CommitReport, ParticipantFailure, Reconciler};
pub use repository::{
    AnswerRepository, FieldRepository, LedgerRepository, OutcomeRepository, ParticipantDirectory,
    Repositories,
};
