use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;
use crate::constraint::{system_defaults, Constraint};
use crate::cycle::Cycle;
use crate::ids::{CommitmentId, ConstraintId, LeaveId};
use crate::leave::LeaveBlock;

/// Shift timing configuration. Informational for display and export; the
/// scheduling core only consumes the derived available-hours table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkConfig {
    pub shift_hours: u32,
    pub shift_start: String,
    pub shift_end: String,
    pub break_minutes: u32,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            shift_hours: 12,
            shift_start: "06:00".into(),
            shift_end: "18:00".into(),
            break_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub timezone: String,
    pub week_starts_on: String,
    pub theme: String,
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            timezone: "UTC".into(),
            week_starts_on: "monday".into(),
            theme: "dark".into(),
            notifications: true,
        }
    }
}

/// The master settings aggregate. Persisted as one versioned document;
/// command execution applies pure transforms to it and writes back with an
/// optimistic version check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDoc {
    pub cycle: Option<Cycle>,
    pub work: WorkConfig,
    pub constraints: Vec<Constraint>,
    pub commitments: Vec<Commitment>,
    pub leave_blocks: Vec<LeaveBlock>,
    pub preferences: Preferences,
}

impl Default for SettingsDoc {
    fn default() -> Self {
        Self {
            cycle: None,
            work: WorkConfig::default(),
            constraints: system_defaults(),
            commitments: Vec::new(),
            leave_blocks: Vec::new(),
            preferences: Preferences::default(),
        }
    }
}

impl SettingsDoc {
    pub fn commitment(&self, id: CommitmentId) -> Option<&Commitment> {
        self.commitments.iter().find(|c| c.id == id)
    }

    pub fn commitment_mut(&mut self, id: CommitmentId) -> Option<&mut Commitment> {
        self.commitments.iter_mut().find(|c| c.id == id)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.id == id)
    }

    pub fn leave_block(&self, id: LeaveId) -> Option<&LeaveBlock> {
        self.leave_blocks.iter().find(|l| l.id == id)
    }

    pub fn active_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| c.is_active)
    }
}
