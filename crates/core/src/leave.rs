use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::LeaveId;

/// An inclusive leave range. Overlapping blocks are allowed; callers surface
/// overlap as a warning, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBlock {
    pub id: LeaveId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LeaveBlock {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn overlaps(&self, other: &LeaveBlock) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    /// Every date in the block, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }
}
