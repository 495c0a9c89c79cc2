//! Database schemas for Scoreboard
//!
//! MongoDB document structures for field sets, answers, the outcome record,
//! the point ledger and participants.

mod answer;
mod field_set;
mod ledger;
mod outcome;
mod participant;

pub use answer::{AnswerDoc, ANSWER_COLLECTION};
pub use field_set::{FieldSetDoc, FIELD_SET_COLLECTION};
pub use ledger::{LedgerDoc, LEDGER_COLLECTION};
pub use outcome::{OutcomeDoc, CURRENT_OUTCOME_ID, OUTCOME_COLLECTION};
pub use participant::{ParticipantDoc, PARTICIPANT_COLLECTION};
