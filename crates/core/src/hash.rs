use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::calendar::CalendarDay;
use crate::error::CoreError;

/// Content hash of a day list: SHA-256 over a canonical serialization, days
/// sorted by date so input ordering never changes the digest. Snapshot
/// addressing and undo correctness both rest on this.
pub fn compute_state_hash(days: &[CalendarDay]) -> Result<String, CoreError> {
    let mut sorted: Vec<&CalendarDay> = days.iter().collect();
    sorted.sort_by_key(|d| d.date);

    let mut hasher = Sha256::new();
    for day in sorted {
        let bytes =
            serde_json::to_vec(day).map_err(|e| CoreError::Serialization(e.to_string()))?;
        hasher.update(&bytes);
        hasher.update(b"\n");
    }

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for byte in digest {
        write!(hex, "{byte:02x}").map_err(|e| CoreError::Serialization(e.to_string()))?;
    }
    Ok(hex)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayDiff {
    pub date: NaiveDate,
    pub kind: DiffKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDiff {
    pub changes: Vec<DayDiff>,
    pub affected_dates: Vec<NaiveDate>,
    pub summary: String,
}

/// Classifies every date present on either side as added, removed, or
/// modified; unchanged dates are omitted. `affected_dates` is the sorted
/// union of changed dates.
pub fn diff_states(before: &[CalendarDay], after: &[CalendarDay]) -> StateDiff {
    let before_by_date: BTreeMap<NaiveDate, &CalendarDay> =
        before.iter().map(|d| (d.date, d)).collect();
    let after_by_date: BTreeMap<NaiveDate, &CalendarDay> =
        after.iter().map(|d| (d.date, d)).collect();

    let mut changes = Vec::new();
    for (date, day) in &after_by_date {
        match before_by_date.get(date) {
            None => changes.push(DayDiff { date: *date, kind: DiffKind::Added }),
            Some(prev) if *prev != *day => {
                changes.push(DayDiff { date: *date, kind: DiffKind::Modified })
            }
            Some(_) => {}
        }
    }
    for date in before_by_date.keys() {
        if !after_by_date.contains_key(date) {
            changes.push(DayDiff { date: *date, kind: DiffKind::Removed });
        }
    }

    changes.sort_by_key(|c| c.date);
    let affected_dates: Vec<NaiveDate> = changes.iter().map(|c| c.date).collect();
    let summary = format!("{} days changed", affected_dates.len());

    StateDiff { changes, affected_dates, summary }
}
