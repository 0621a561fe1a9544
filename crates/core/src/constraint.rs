use serde::{Deserialize, Serialize};

use crate::ids::ConstraintId;
use crate::types::{CommitmentKind, WorkType};

/// Scopes an `Immutable` rule can protect. Only the work rotation today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmutableScope {
    Work,
}

/// Closed set of rule types. New kinds are a compile-time addition, not a
/// string to match on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ConstraintRule {
    /// Forbid scheduling `activity` commitments on the listed work types.
    NoActivityOn {
        activity: CommitmentKind,
        work_types: Vec<WorkType>,
    },
    /// Removals/modifications targeting the scope are never legal.
    Immutable { scope: ImmutableScope },
    /// At most `value` simultaneously active commitments of `scope`.
    MaxConcurrent { scope: CommitmentKind, value: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    pub name: String,
    #[serde(flatten)]
    pub rule: ConstraintRule,
    pub hard: bool,
    /// Seeded constraints cannot be removed, only deactivated.
    pub is_system: bool,
    pub is_active: bool,
}

/// The three seeded defaults every new settings document starts with.
pub fn system_defaults() -> Vec<Constraint> {
    vec![
        Constraint {
            id: ConstraintId::new(),
            name: "no_study_on_nights".into(),
            rule: ConstraintRule::NoActivityOn {
                activity: CommitmentKind::Study,
                work_types: vec![WorkType::WorkNight],
            },
            hard: true,
            is_system: true,
            is_active: true,
        },
        Constraint {
            id: ConstraintId::new(),
            name: "work_is_immutable".into(),
            rule: ConstraintRule::Immutable { scope: ImmutableScope::Work },
            hard: true,
            is_system: true,
            is_active: true,
        },
        Constraint {
            id: ConstraintId::new(),
            name: "max_concurrent_education".into(),
            rule: ConstraintRule::MaxConcurrent {
                scope: CommitmentKind::Education,
                value: 2,
            },
            hard: true,
            is_system: true,
            is_active: true,
        },
    ]
}
