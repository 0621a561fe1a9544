use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use rotaplan_core::{
    calendar::CalendarDay,
    change::Change,
    constraint::ConstraintRule,
    ids::AlternativeId,
    mutation::{Alternative, AlternativeKind, Violation},
    settings::SettingsDoc,
    types::{CommitmentStatus, WorkType},
};

use crate::generate::activity_matches;
use crate::validate::validate;

/// Synthesizes corrective proposals from a failed validation. Every emitted
/// alternative revalidates clean; candidates that would still violate a rule
/// are dropped here rather than offered.
pub fn generate_alternatives(
    changes: &[Change],
    violations: &[Violation],
    days: &[CalendarDay],
    settings: &SettingsDoc,
) -> Vec<Alternative> {
    let Some(add_index) = changes
        .iter()
        .position(|c| matches!(c, Change::AddCommitment { .. }))
    else {
        return Vec::new();
    };

    let mut candidates = Vec::new();

    if violations.iter().any(is_concurrency_violation) {
        candidates.extend(queue_alternative(changes, add_index));
        candidates.extend(replace_alternatives(changes, add_index, settings));
        candidates.extend(mark_pending_alternative(changes, add_index));
    }

    if violations.iter().any(is_schedule_violation) {
        candidates.extend(valid_days_alternative(changes, add_index, days, settings));
    }

    candidates
        .into_iter()
        .filter(|alt| validate(&alt.changes, days, settings).is_valid)
        .collect()
}

// Classification is a keyword match over the violation text, not the
// constraint kind, so user-authored constraint names participate too.
fn violation_text(violation: &Violation) -> String {
    let mut text = violation.reason.to_lowercase();
    if let Some(name) = &violation.constraint_name {
        text.push(' ');
        text.push_str(&name.to_lowercase());
    }
    text
}

fn is_concurrency_violation(violation: &Violation) -> bool {
    let text = violation_text(violation);
    text.contains("concurrent") || text.contains("max")
}

fn is_schedule_violation(violation: &Violation) -> bool {
    let text = violation_text(violation);
    text.contains("night") || text.contains("schedule")
}

fn queue_alternative(changes: &[Change], add_index: usize) -> Option<Alternative> {
    let mut altered = changes.to_vec();
    let Change::AddCommitment { commitment, .. } = &mut altered[add_index] else {
        return None;
    };
    let name = commitment.name.clone();
    commitment.status = CommitmentStatus::Queued;

    Some(Alternative {
        id: AlternativeId::new(),
        kind: AlternativeKind::Queue,
        description: format!("Queue '{name}' until a slot frees up"),
        changes: altered,
    })
}

/// Pairs a pause of an existing same-scope active commitment with the
/// original add, leaving net concurrency unchanged. At most two options.
fn replace_alternatives(
    changes: &[Change],
    add_index: usize,
    settings: &SettingsDoc,
) -> Vec<Alternative> {
    let Change::AddCommitment { commitment, .. } = &changes[add_index] else {
        return Vec::new();
    };

    settings
        .commitments
        .iter()
        .filter(|c| c.is_active() && c.kind == commitment.kind && c.id != commitment.id)
        .take(2)
        .map(|existing| {
            let mut altered = vec![Change::UpdateCommitment {
                commitment_id: existing.id,
                status: CommitmentStatus::Paused,
            }];
            altered.extend(changes.iter().cloned());
            Alternative {
                id: AlternativeId::new(),
                kind: AlternativeKind::Replace,
                description: format!(
                    "Pause '{}' and activate '{}' instead",
                    existing.name, commitment.name
                ),
                changes: altered,
            }
        })
        .collect()
}

fn mark_pending_alternative(changes: &[Change], add_index: usize) -> Option<Alternative> {
    let mut altered = changes.to_vec();
    let Change::AddCommitment { commitment, .. } = &mut altered[add_index] else {
        return None;
    };
    let name = commitment.name.clone();
    commitment.status = CommitmentStatus::Queued;
    commitment.notes = Some(match commitment.notes.take() {
        Some(notes) => format!("{notes}; Pending - awaiting slot"),
        None => "Pending - awaiting slot".into(),
    });

    Some(Alternative {
        id: AlternativeId::new(),
        kind: AlternativeKind::MarkPending,
        description: format!("Mark '{name}' as pending"),
        changes: altered,
    })
}

/// Filters the affected dates down to days whose work type no active
/// `no_activity_on` rule prohibits for this commitment.
fn valid_days_alternative(
    changes: &[Change],
    add_index: usize,
    days: &[CalendarDay],
    settings: &SettingsDoc,
) -> Option<Alternative> {
    let mut altered = changes.to_vec();
    let Change::AddCommitment { commitment, affected_dates } = &mut altered[add_index] else {
        return None;
    };

    let prohibited: HashSet<WorkType> = settings
        .active_constraints()
        .filter_map(|c| match &c.rule {
            ConstraintRule::NoActivityOn { activity, work_types }
                if activity_matches(commitment.kind, *activity) =>
            {
                Some(work_types.iter().copied())
            }
            _ => None,
        })
        .flatten()
        .collect();

    let work_types: HashMap<NaiveDate, WorkType> =
        days.iter().map(|d| (d.date, d.work_type)).collect();

    let total = affected_dates.len();
    affected_dates.retain(|date| {
        work_types
            .get(date)
            .is_none_or(|wt| !prohibited.contains(wt))
    });

    if affected_dates.is_empty() || affected_dates.len() == total {
        return None;
    }

    let description = format!(
        "Schedule '{}' only on allowed days ({} of {} dates)",
        commitment.name,
        affected_dates.len(),
        total
    );
    Some(Alternative {
        id: AlternativeId::new(),
        kind: AlternativeKind::ScheduleValidOnly,
        description,
        changes: altered,
    })
}
