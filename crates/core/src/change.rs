use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;
use crate::ids::CommitmentId;
use crate::leave::LeaveBlock;
use crate::types::CommitmentStatus;

/// What a proposal is trying to accomplish, for display and audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ScheduleCommitment,
    RemoveCommitment,
    PauseCommitment,
    PlanLeave,
    AdjustSchedule,
}

/// One typed change inside a proposal. Exhaustively matched everywhere a
/// change is validated or applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    AddCommitment {
        commitment: Commitment,
        affected_dates: Vec<NaiveDate>,
    },
    RemoveCommitment {
        commitment_id: CommitmentId,
    },
    UpdateCommitment {
        commitment_id: CommitmentId,
        status: CommitmentStatus,
    },
    AddLeave {
        leave: LeaveBlock,
    },
    RemoveWork {
        dates: Vec<NaiveDate>,
    },
    ModifyWork {
        dates: Vec<NaiveDate>,
    },
}
