use chrono::NaiveDate;

use rotaplan_core::{
    calendar::CalendarDay,
    change::Change,
    commitment::{Commitment, SchedulingRules},
    cycle::CycleBlock,
    ids::{CommitmentId, LeaveId, UserId},
    leave::LeaveBlock,
    types::{CommitmentKind, CommitmentStatus, StudySlot, Tier, WorkType},
};
use rotaplan_engine::{Command, CommandOutcome, Engine, EngineError, UpdateCycle};
use rotaplan_storage::{SqliteStorage, StorageError};

/// A single user's engine over in-memory storage, plus builders for the
/// fixtures most tests need.
pub struct TestPeer {
    pub engine: Engine,
}

impl TestPeer {
    pub fn new() -> Result<Self, StorageError> {
        Self::with_tier(Tier::Pro)
    }

    pub fn with_tier(tier: Tier) -> Result<Self, StorageError> {
        Ok(Self {
            engine: Engine::new(SqliteStorage::open_in_memory()?, UserId::new(), tier),
        })
    }

    /// 5 day shifts, 5 nights, 5 off; anchored so 2026-01-01 is cycle day 4.
    pub fn standard_cycle() -> UpdateCycle {
        UpdateCycle {
            name: Some("5-5-5".into()),
            pattern: Some(vec![
                CycleBlock { work_type: WorkType::WorkDay, duration_days: 5 },
                CycleBlock { work_type: WorkType::WorkNight, duration_days: 5 },
                CycleBlock { work_type: WorkType::Off, duration_days: 5 },
            ]),
            anchor_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            anchor_cycle_day: Some(4),
            shift_by_days: None,
        }
    }

    pub fn install_standard_cycle(&mut self) -> Result<CommandOutcome, EngineError> {
        self.engine.execute(Command::UpdateCycle(Self::standard_cycle()))
    }

    pub fn commitment(
        name: &str,
        kind: CommitmentKind,
        status: CommitmentStatus,
        study_on: Vec<StudySlot>,
        duration_hours: f64,
    ) -> Commitment {
        Commitment {
            id: CommitmentId::new(),
            name: name.into(),
            kind,
            status,
            scheduling: SchedulingRules {
                study_on,
                exclude: Vec::new(),
                duration_hours,
            },
            notes: None,
        }
    }

    /// An active education commitment scheduled on off days.
    pub fn education(name: &str) -> Commitment {
        Self::commitment(
            name,
            CommitmentKind::Education,
            CommitmentStatus::Active,
            vec![StudySlot::Off],
            4.0,
        )
    }

    pub fn leave(name: &str, start: NaiveDate, end: NaiveDate) -> LeaveBlock {
        LeaveBlock {
            id: LeaveId::new(),
            name: name.into(),
            start_date: start,
            end_date: end,
            notes: None,
        }
    }

    pub fn add_commitment_change(commitment: Commitment, dates: Vec<NaiveDate>) -> Change {
        Change::AddCommitment { commitment, affected_dates: dates }
    }

    pub fn day(&self, date: NaiveDate) -> Result<Option<CalendarDay>, EngineError> {
        Ok(self.engine.calendar(date, date)?.into_iter().next())
    }
}
