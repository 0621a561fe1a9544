use std::collections::BTreeMap;

use chrono::NaiveDate;

use rotaplan_core::{
    calendar::{CalendarDay, DayCommitment},
    change::Change,
};

/// Applies a proposal's changes to a copy of the day list, in list order.
/// Hour totals are always a full resum, never an incremental add. Change
/// kinds that act on settings rather than days (status updates, work edits)
/// are handled one layer up by the command executor and skipped here.
pub fn apply_changes(days: &[CalendarDay], changes: &[Change]) -> Vec<CalendarDay> {
    let mut by_date: BTreeMap<NaiveDate, CalendarDay> =
        days.iter().map(|d| (d.date, d.clone())).collect();

    for change in changes {
        match change {
            Change::AddCommitment { commitment, affected_dates } => {
                for date in affected_dates {
                    if let Some(day) = by_date.get_mut(date) {
                        day.state.commitments.push(DayCommitment {
                            commitment_id: commitment.id,
                            name: commitment.name.clone(),
                            kind: commitment.kind,
                            hours: commitment.scheduling.duration_hours,
                            is_preview: false,
                        });
                        day.state.recompute_hours();
                    }
                }
            }

            Change::RemoveCommitment { commitment_id } => {
                for day in by_date.values_mut() {
                    let before = day.state.commitments.len();
                    day.state.commitments.retain(|c| c.commitment_id != *commitment_id);
                    if day.state.commitments.len() != before {
                        day.state.recompute_hours();
                    }
                }
            }

            Change::AddLeave { leave } => {
                for date in leave.dates() {
                    if let Some(day) = by_date.get_mut(&date) {
                        day.state.is_leave = true;
                        day.state.available_hours = 16.0;
                        day.state.add_tag("leave");
                        day.state.recompute_hours();
                    }
                }
            }

            Change::UpdateCommitment { .. }
            | Change::RemoveWork { .. }
            | Change::ModifyWork { .. } => {}
        }
    }

    by_date.into_values().collect()
}
