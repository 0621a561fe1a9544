use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use chrono::NaiveDate;

use rotaplan_core::{
    calendar::CalendarDay,
    change::Change,
    constraint::{Constraint, ConstraintRule},
    ids::CommitmentId,
    mutation::{ValidationResult, Violation, ViolationKind},
    settings::SettingsDoc,
    types::{CommitmentStatus, WorkType},
};

use crate::generate::activity_matches;

/// Evaluates every active constraint against every change. Violations are
/// returned as data; nothing here is an error. Warnings (leave overlap)
/// never affect validity.
pub fn validate(
    changes: &[Change],
    days: &[CalendarDay],
    settings: &SettingsDoc,
) -> ValidationResult {
    let work_types: HashMap<NaiveDate, WorkType> =
        days.iter().map(|d| (d.date, d.work_type)).collect();

    // Commitments the proposal itself deactivates do not count toward
    // concurrency limits: a pause-and-replace pair is net neutral.
    let deactivated: HashSet<CommitmentId> = changes
        .iter()
        .filter_map(|c| match c {
            Change::UpdateCommitment { commitment_id, status }
                if *status != CommitmentStatus::Active =>
            {
                Some(*commitment_id)
            }
            _ => None,
        })
        .collect();

    let mut violations = Vec::new();
    let mut warnings = Vec::new();

    for change in changes {
        for constraint in settings.active_constraints() {
            check_constraint(change, constraint, &work_types, settings, &deactivated, &mut violations);
        }
        if let Change::AddLeave { leave } = change {
            for existing in &settings.leave_blocks {
                if existing.id != leave.id && existing.overlaps(leave) {
                    warnings.push(format!(
                        "Leave '{}' overlaps existing leave '{}'",
                        leave.name, existing.name
                    ));
                }
            }
        }
    }

    let is_valid = violations.is_empty();
    let explanation = explain(&violations);
    ValidationResult {
        is_valid,
        violations,
        warnings,
        explanation,
        alternatives: Vec::new(),
    }
}

fn check_constraint(
    change: &Change,
    constraint: &Constraint,
    work_types: &HashMap<NaiveDate, WorkType>,
    settings: &SettingsDoc,
    deactivated: &HashSet<CommitmentId>,
    violations: &mut Vec<Violation>,
) {
    match (&constraint.rule, change) {
        (
            ConstraintRule::NoActivityOn { activity, work_types: prohibited },
            Change::AddCommitment { commitment, affected_dates },
        ) => {
            if !activity_matches(commitment.kind, *activity) {
                return;
            }
            for date in affected_dates {
                if let Some(work_type) = work_types.get(date)
                    && prohibited.contains(work_type)
                {
                    violations.push(Violation {
                        kind: ViolationKind::NoActivityOn,
                        constraint_name: Some(constraint.name.clone()),
                        date: Some(*date),
                        reason: format!(
                            "Cannot schedule {} on {} days (affects {})",
                            activity.as_str(),
                            work_type.as_str(),
                            date
                        ),
                    });
                }
            }
        }

        (ConstraintRule::Immutable { .. }, Change::RemoveWork { dates }) => {
            violations.push(Violation {
                kind: ViolationKind::Immutable,
                constraint_name: Some(constraint.name.clone()),
                date: dates.first().copied(),
                reason: "Cannot remove work days: work schedule is immutable".into(),
            });
        }

        (ConstraintRule::Immutable { .. }, Change::ModifyWork { dates }) => {
            violations.push(Violation {
                kind: ViolationKind::Immutable,
                constraint_name: Some(constraint.name.clone()),
                date: dates.first().copied(),
                reason: "Cannot modify work days: work schedule is immutable".into(),
            });
        }

        (
            ConstraintRule::MaxConcurrent { scope, value },
            Change::AddCommitment { commitment, .. },
        ) => {
            if commitment.status != CommitmentStatus::Active || commitment.kind != *scope {
                return;
            }
            // Count is taken before the proposed addition; queued
            // commitments never count toward the limit.
            let active = settings
                .commitments
                .iter()
                .filter(|c| c.is_active() && c.kind == *scope && !deactivated.contains(&c.id))
                .count() as u32;
            if active >= *value {
                violations.push(Violation {
                    kind: ViolationKind::MaxConcurrent,
                    constraint_name: Some(constraint.name.clone()),
                    date: None,
                    reason: format!(
                        "Already have {} active {} commitments (max: {})",
                        active,
                        scope.as_str(),
                        value
                    ),
                });
            }
        }

        _ => {}
    }
}

/// Regenerated on every call so it always matches the violation set.
fn explain(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "All changes are valid and can be applied.".into();
    }
    let mut text = String::from("This proposal cannot be applied because:");
    for (i, violation) in violations.iter().enumerate() {
        let _ = write!(text, "\n{}. {}", i + 1, violation.reason);
    }
    text
}
