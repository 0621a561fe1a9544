use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::CommitmentId;
use crate::types::{CommitmentKind, WorkType};

/// A commitment placed on a specific day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCommitment {
    pub commitment_id: CommitmentId,
    pub name: String,
    pub kind: CommitmentKind,
    pub hours: f64,
    pub is_preview: bool,
}

/// Mutable per-day scheduling state. `manual_override` marks days that were
/// explicitly set and must survive regeneration verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayState {
    pub commitments: Vec<DayCommitment>,
    pub available_hours: f64,
    pub used_hours: f64,
    pub is_overloaded: bool,
    pub is_leave: bool,
    pub tags: Vec<String>,
    #[serde(default)]
    pub manual_override: bool,
}

impl DayState {
    pub fn empty(available_hours: f64) -> Self {
        Self {
            commitments: Vec::new(),
            available_hours,
            used_hours: 0.0,
            is_overloaded: false,
            is_leave: false,
            tags: Vec::new(),
            manual_override: false,
        }
    }

    /// Full resum of `used_hours` from the commitment list, never an
    /// incremental add, so repeated application stays idempotent. Also
    /// refreshes the overload flag.
    pub fn recompute_hours(&mut self) {
        self.used_hours = self.commitments.iter().map(|c| c.hours).sum();
        self.is_overloaded = self.used_hours > self.available_hours;
    }

    /// Adds a tag only if absent.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }
}

/// One date's derived state for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub cycle_day: u32,
    pub work_type: WorkType,
    pub state: DayState,
}
