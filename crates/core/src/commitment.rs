use serde::{Deserialize, Serialize};

use crate::ids::CommitmentId;
use crate::types::{CommitmentKind, CommitmentStatus, StudySlot, WorkType};

/// Where and how long a commitment wants to be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRules {
    /// Day slots the commitment may occupy.
    pub study_on: Vec<StudySlot>,
    /// Work types the commitment must never land on, regardless of slots.
    #[serde(default)]
    pub exclude: Vec<WorkType>,
    pub duration_hours: f64,
}

impl SchedulingRules {
    /// Whether a day of the given work type is eligible under these rules
    /// alone (constraints are checked separately).
    pub fn allows(&self, work_type: WorkType) -> bool {
        if self.exclude.contains(&work_type) {
            return false;
        }
        self.study_on.iter().any(|slot| slot.matches(work_type))
    }
}

/// A recurring non-work activity competing for free hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    pub id: CommitmentId,
    pub name: String,
    pub kind: CommitmentKind,
    pub status: CommitmentStatus,
    pub scheduling: SchedulingRules,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Commitment {
    pub fn is_active(&self) -> bool {
        self.status == CommitmentStatus::Active
    }
}
