use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use rotaplan_core::{
    commitment::Commitment,
    constraint::Constraint,
    cycle::{Cycle, CycleBlock},
    ids::{CommitmentId, ConstraintId, CycleId, LeaveId},
    leave::LeaveBlock,
    settings::SettingsDoc,
    types::WorkType,
};

use crate::error::EngineError;

/// Partial cycle update. Absent fields keep their current value;
/// `shift_by_days` nudges the anchor date, rephasing the whole rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCycle {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pattern: Option<Vec<CycleBlock>>,
    #[serde(default)]
    pub anchor_date: Option<NaiveDate>,
    #[serde(default)]
    pub anchor_cycle_day: Option<u32>,
    #[serde(default)]
    pub shift_by_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideDays {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub work_type: WorkType,
    #[serde(default)]
    pub preserve_off_days: bool,
}

/// The closed set of executable actions. Wire input goes through
/// `from_action`, which rejects anything outside this enum before it can
/// touch state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    UpdateCycle(UpdateCycle),
    AddCommitment { commitment: Commitment },
    RemoveCommitment { commitment_id: CommitmentId },
    AddLeave { leave: LeaveBlock },
    RemoveLeave { leave_id: LeaveId },
    UpdateConstraint { constraint: Constraint },
    RemoveConstraint { constraint_id: ConstraintId },
    OverrideDays(OverrideDays),
    Undo,
    Redo,
}

impl Command {
    /// Gate for parser/wire input: unknown actions are an error, malformed
    /// payloads are an error, nothing is ever executed by string dispatch.
    pub fn from_action(action: &str, payload: serde_json::Value) -> Result<Self, EngineError> {
        fn decode<T: serde::de::DeserializeOwned>(
            action: &str,
            payload: serde_json::Value,
        ) -> Result<T, EngineError> {
            serde_json::from_value(payload)
                .map_err(|e| EngineError::InvalidCommand(format!("{action}: {e}")))
        }

        match action {
            "update_cycle" => Ok(Self::UpdateCycle(decode(action, payload)?)),
            "add_commitment" => {
                let commitment = decode(action, payload)?;
                Ok(Self::AddCommitment { commitment })
            }
            "remove_commitment" => {
                let commitment_id = decode(action, payload)?;
                Ok(Self::RemoveCommitment { commitment_id })
            }
            "add_leave" => {
                let leave = decode(action, payload)?;
                Ok(Self::AddLeave { leave })
            }
            "remove_leave" => {
                let leave_id = decode(action, payload)?;
                Ok(Self::RemoveLeave { leave_id })
            }
            "update_constraint" => {
                let constraint = decode(action, payload)?;
                Ok(Self::UpdateConstraint { constraint })
            }
            "remove_constraint" => {
                let constraint_id = decode(action, payload)?;
                Ok(Self::RemoveConstraint { constraint_id })
            }
            "override_days" => Ok(Self::OverrideDays(decode(action, payload)?)),
            "undo" => Ok(Self::Undo),
            "redo" => Ok(Self::Redo),
            other => Err(EngineError::UnknownAction(other.to_string())),
        }
    }

    pub fn action_name(&self) -> &'static str {
        match self {
            Self::UpdateCycle(_) => "update_cycle",
            Self::AddCommitment { .. } => "add_commitment",
            Self::RemoveCommitment { .. } => "remove_commitment",
            Self::AddLeave { .. } => "add_leave",
            Self::RemoveLeave { .. } => "remove_leave",
            Self::UpdateConstraint { .. } => "update_constraint",
            Self::RemoveConstraint { .. } => "remove_constraint",
            Self::OverrideDays(_) => "override_days",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }

    /// Pure settings transform. The caller writes the result back with an
    /// optimistic version check; nothing here touches storage.
    pub fn apply_to_settings(&self, doc: &mut SettingsDoc) -> Result<(), EngineError> {
        match self {
            Self::UpdateCycle(update) => apply_cycle_update(doc, update),

            Self::AddCommitment { commitment } => {
                if doc.commitment(commitment.id).is_some() {
                    return Err(EngineError::InvalidCommand(format!(
                        "commitment {} already exists",
                        commitment.id
                    )));
                }
                doc.commitments.push(commitment.clone());
                Ok(())
            }

            Self::RemoveCommitment { commitment_id } => {
                let before = doc.commitments.len();
                doc.commitments.retain(|c| c.id != *commitment_id);
                if doc.commitments.len() == before {
                    return Err(EngineError::InvalidCommand(format!(
                        "commitment {commitment_id} not found"
                    )));
                }
                Ok(())
            }

            Self::AddLeave { leave } => {
                if leave.start_date > leave.end_date {
                    return Err(EngineError::InvalidCommand(
                        "leave start date is after end date".into(),
                    ));
                }
                doc.leave_blocks.push(leave.clone());
                Ok(())
            }

            Self::RemoveLeave { leave_id } => {
                let before = doc.leave_blocks.len();
                doc.leave_blocks.retain(|l| l.id != *leave_id);
                if doc.leave_blocks.len() == before {
                    return Err(EngineError::InvalidCommand(format!(
                        "leave block {leave_id} not found"
                    )));
                }
                Ok(())
            }

            Self::UpdateConstraint { constraint } => {
                match doc.constraints.iter_mut().find(|c| c.id == constraint.id) {
                    Some(existing) => {
                        let keep_system = existing.is_system;
                        *existing = constraint.clone();
                        existing.is_system = keep_system;
                    }
                    None => doc.constraints.push(constraint.clone()),
                }
                Ok(())
            }

            Self::RemoveConstraint { constraint_id } => {
                match doc.constraint(*constraint_id) {
                    Some(c) if c.is_system => Err(EngineError::InvalidCommand(
                        "system constraints can only be deactivated, not removed".into(),
                    )),
                    Some(_) => {
                        doc.constraints.retain(|c| c.id != *constraint_id);
                        Ok(())
                    }
                    None => Err(EngineError::InvalidCommand(format!(
                        "constraint {constraint_id} not found"
                    ))),
                }
            }

            // No settings change: override writes days directly, undo/redo
            // restore logged snapshots.
            Self::OverrideDays(_) | Self::Undo | Self::Redo => Ok(()),
        }
    }
}

fn apply_cycle_update(doc: &mut SettingsDoc, update: &UpdateCycle) -> Result<(), EngineError> {
    let mut cycle = match (&doc.cycle, &update.pattern, &update.anchor_date) {
        (Some(existing), _, _) => existing.clone(),
        (None, Some(pattern), Some(anchor_date)) => Cycle {
            id: CycleId::new(),
            name: update.name.clone().unwrap_or_else(|| "rotation".into()),
            pattern: pattern.clone(),
            anchor_date: *anchor_date,
            anchor_cycle_day: update.anchor_cycle_day.unwrap_or(1),
        },
        (None, _, _) => {
            return Err(EngineError::InvalidCommand(
                "creating a cycle requires a pattern and an anchor date".into(),
            ));
        }
    };

    if let Some(name) = &update.name {
        cycle.name = name.clone();
    }
    if let Some(pattern) = &update.pattern {
        cycle.pattern = pattern.clone();
    }
    if let Some(anchor_date) = update.anchor_date {
        cycle.anchor_date = anchor_date;
    }
    if let Some(anchor_cycle_day) = update.anchor_cycle_day {
        cycle.anchor_cycle_day = anchor_cycle_day;
    }
    if let Some(shift) = update.shift_by_days {
        cycle.anchor_date = if shift >= 0 {
            cycle
                .anchor_date
                .checked_add_days(Days::new(shift as u64))
                .ok_or_else(|| EngineError::InvalidCommand("anchor shift out of range".into()))?
        } else {
            cycle
                .anchor_date
                .checked_sub_days(Days::new(shift.unsigned_abs()))
                .ok_or_else(|| EngineError::InvalidCommand("anchor shift out of range".into()))?
        };
    }

    cycle.validate()?;
    doc.cycle = Some(cycle);
    Ok(())
}
