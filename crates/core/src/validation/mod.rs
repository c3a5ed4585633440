//! Structural and domain validation rules.
//!
//! Everything in this module is pure: no I/O and no reads of persisted
//! state. Rules check the shape and internal consistency of a candidate,
//! never its relationship to existing records.

pub mod cities;
pub mod errors;
pub mod plate;
pub mod rule_set;
pub mod rules;

use chrono::Datelike;

use crate::types::Timestamp;

pub use errors::{ValidationErrors, ValidationFailure};
pub use rule_set::RuleSet;

/// Values a rule may consult besides the candidate itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    now: Timestamp,
}

impl ValidationContext {
    pub fn new(now: Timestamp) -> Self {
        Self { now }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn current_year(&self) -> i32 {
        self.now.year()
    }
}
