use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::CycleId;
use crate::types::WorkType;

/// One block of a repeating rotation: `duration_days` consecutive days of the
/// same work type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleBlock {
    pub work_type: WorkType,
    pub duration_days: u32,
}

/// A repeating work rotation pinned to the calendar by an anchor: a date
/// known to fall on `anchor_cycle_day` (1-indexed position in the pattern).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: CycleId,
    pub name: String,
    pub pattern: Vec<CycleBlock>,
    pub anchor_date: NaiveDate,
    pub anchor_cycle_day: u32,
}

impl Cycle {
    pub fn cycle_length(&self) -> u32 {
        self.pattern.iter().map(|b| b.duration_days).sum()
    }

    /// Creation-time validation. Projection itself stays permissive against
    /// malformed persisted patterns (see `work_type_for`), but new cycles
    /// must be well formed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.pattern.is_empty() {
            return Err(CoreError::InvalidCycle("pattern is empty".into()));
        }
        if let Some(block) = self.pattern.iter().find(|b| b.duration_days == 0) {
            return Err(CoreError::InvalidCycle(format!(
                "{} block has zero duration",
                block.work_type.as_str()
            )));
        }
        let length = self.cycle_length();
        if length == 0 {
            return Err(CoreError::InvalidCycle("total pattern length is zero".into()));
        }
        if self.anchor_cycle_day < 1 || self.anchor_cycle_day > length {
            return Err(CoreError::InvalidCycle(format!(
                "anchor cycle day {} outside 1..={length}",
                self.anchor_cycle_day
            )));
        }
        Ok(())
    }

    /// Cycle day (1-indexed) for any date. Pure function of the anchor pair.
    pub fn cycle_day_for(&self, target: NaiveDate) -> u32 {
        cycle_day_for(target, self.anchor_date, self.anchor_cycle_day, self.cycle_length())
    }

    pub fn work_type_for(&self, cycle_day: u32) -> WorkType {
        work_type_for(cycle_day, &self.pattern)
    }
}

/// Maps a date to its 1-indexed position in a repeating cycle. Holds for
/// dates before the anchor as well: the offset modulo is euclidean, never
/// truncating toward zero.
pub fn cycle_day_for(
    target: NaiveDate,
    anchor_date: NaiveDate,
    anchor_cycle_day: u32,
    cycle_length: u32,
) -> u32 {
    // A zero-length pattern can only come from malformed persisted data;
    // project everything to day 1 (which `work_type_for` resolves to Off)
    // instead of dividing by zero.
    if cycle_length == 0 {
        return 1;
    }
    let offset = (target - anchor_date).num_days();
    let base = i64::from(anchor_cycle_day) - 1 + offset;
    (base.rem_euclid(i64::from(cycle_length)) as u32) + 1
}

/// Walks the pattern accumulating block durations; the first block whose
/// cumulative length reaches `cycle_day` wins. A pattern too short to reach
/// `cycle_day` (malformed, but possibly persisted) falls back to `Off`
/// rather than failing; callers relying on strictness validate at creation.
pub fn work_type_for(cycle_day: u32, pattern: &[CycleBlock]) -> WorkType {
    let mut cumulative = 0u32;
    for block in pattern {
        cumulative += block.duration_days;
        if cycle_day <= cumulative {
            return block.work_type;
        }
    }
    WorkType::Off
}

/// Hours left for non-work commitments on a day of the given kind. Leave
/// frees the whole waking day regardless of the rotation.
pub fn available_hours(work_type: WorkType, is_leave: bool) -> f64 {
    if is_leave {
        return 16.0;
    }
    match work_type {
        WorkType::Off => 12.0,
        WorkType::WorkDay => 4.0,
        WorkType::WorkNight => 2.0,
        WorkType::Blank => 0.0,
    }
}
