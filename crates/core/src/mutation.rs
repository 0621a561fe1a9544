use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::change::{Change, Intent};
use crate::ids::{AlternativeId, MutationId};
use crate::types::MutationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Overload,
    NoActivityOn,
    Immutable,
    MaxConcurrent,
}

/// A broken rule. Violations are data returned to the caller, never errors;
/// a proposal carrying violations simply cannot be approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub constraint_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeKind {
    Queue,
    Replace,
    MarkPending,
    ScheduleValidOnly,
}

/// A corrective proposal synthesized from a violation set. Selecting one
/// spawns a fresh mutation carrying these changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub id: AlternativeId,
    pub kind: AlternativeKind,
    pub description: String,
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
    pub explanation: String,
    pub alternatives: Vec<Alternative>,
}

/// A proposed or applied change record, gated behind approval. Undo of an
/// approved mutation restores the snapshot keyed by `previous_state_hash`
/// and marks the record rejected with `undone` set; there is no separate
/// terminal undone status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub id: MutationId,
    pub status: MutationStatus,
    pub intent: Intent,
    pub changes: Vec<Change>,
    pub violations: Vec<Violation>,
    pub alternatives: Vec<Alternative>,
    pub explanation: String,
    pub previous_state_hash: Option<String>,
    pub new_state_hash: Option<String>,
    pub undone: bool,
    pub is_alternative: bool,
    pub parent_mutation_id: Option<MutationId>,
}

impl MutationRecord {
    pub fn alternative(&self, id: AlternativeId) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.id == id)
    }
}
