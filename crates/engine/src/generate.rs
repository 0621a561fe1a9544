use std::collections::HashSet;

use chrono::NaiveDate;

use rotaplan_core::{
    available_hours,
    calendar::{CalendarDay, DayCommitment, DayState},
    commitment::Commitment,
    constraint::{Constraint, ConstraintRule},
    cycle::Cycle,
    leave::LeaveBlock,
    mutation::{Violation, ViolationKind},
    types::{CommitmentKind, WorkType},
};

/// Builds the day-by-day state map for an inclusive date range. Pure: same
/// inputs, same output. Commitments are applied in a separate pass.
pub fn generate(
    start: NaiveDate,
    end: NaiveDate,
    cycle: &Cycle,
    leave_blocks: &[LeaveBlock],
) -> Vec<CalendarDay> {
    // One set lookup per date keeps a full-year range linear.
    let leave_dates: HashSet<NaiveDate> = leave_blocks
        .iter()
        .flat_map(|block| block.dates())
        .collect();

    let mut days = Vec::new();
    let mut date = start;
    while date <= end {
        let cycle_day = cycle.cycle_day_for(date);
        let work_type = cycle.work_type_for(cycle_day);
        let is_leave = leave_dates.contains(&date);

        let mut state = DayState::empty(available_hours(work_type, is_leave));
        if is_leave {
            state.is_leave = true;
            state.add_tag("leave");
        }

        days.push(CalendarDay { date, cycle_day, work_type, state });
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    days
}

/// Whether a commitment falls under a `no_activity_on` rule for `activity`.
/// Study and education are interchangeable for these rules.
pub(crate) fn activity_matches(kind: CommitmentKind, activity: CommitmentKind) -> bool {
    kind == activity || (kind.is_study_like() && activity.is_study_like())
}

fn suppressed_by_constraints(
    kind: CommitmentKind,
    work_type: WorkType,
    constraints: &[Constraint],
) -> bool {
    constraints.iter().any(|c| {
        if !c.is_active {
            return false;
        }
        match &c.rule {
            ConstraintRule::NoActivityOn { activity, work_types } => {
                activity_matches(kind, *activity) && work_types.contains(&work_type)
            }
            _ => false,
        }
    })
}

/// Places active commitments on their eligible days, accumulating hours and
/// flagging overload. Commitments are processed in caller order; when hours
/// run out, later arrivals share the overload rather than being dropped.
pub fn apply_commitments(
    days: &mut [CalendarDay],
    commitments: &[Commitment],
    constraints: &[Constraint],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for commitment in commitments.iter().filter(|c| c.is_active()) {
        for day in days.iter_mut() {
            if !commitment.scheduling.allows(day.work_type) {
                continue;
            }
            if suppressed_by_constraints(commitment.kind, day.work_type, constraints) {
                continue;
            }

            day.state.commitments.push(DayCommitment {
                commitment_id: commitment.id,
                name: commitment.name.clone(),
                kind: commitment.kind,
                hours: commitment.scheduling.duration_hours,
                is_preview: false,
            });
            day.state.recompute_hours();

            if day.state.is_overloaded {
                violations.push(Violation {
                    kind: ViolationKind::Overload,
                    constraint_name: None,
                    date: Some(day.date),
                    reason: format!(
                        "Day is overloaded: {}h used of {}h available",
                        day.state.used_hours, day.state.available_hours
                    ),
                });
            }
        }
    }

    violations
}
