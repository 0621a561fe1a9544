pub mod calendar;
pub mod change;
pub mod commitment;
pub mod constraint;
pub mod cycle;
pub mod error;
pub mod hash;
pub mod ids;
pub mod leave;
pub mod mutation;
pub mod settings;
pub mod types;

pub use calendar::{CalendarDay, DayCommitment, DayState};
pub use change::{Change, Intent};
pub use commitment::{Commitment, SchedulingRules};
pub use constraint::{Constraint, ConstraintRule, ImmutableScope};
pub use cycle::{available_hours, cycle_day_for, work_type_for, Cycle, CycleBlock};
pub use error::CoreError;
pub use hash::{compute_state_hash, diff_states, StateDiff};
pub use ids::*;
pub use leave::LeaveBlock;
pub use mutation::{
    Alternative, AlternativeKind, MutationRecord, ValidationResult, Violation, ViolationKind,
};
pub use settings::SettingsDoc;
pub use types::*;
