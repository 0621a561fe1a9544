use serde::{Deserialize, Serialize};

use crate::CoreError;

/// What a calendar day holds according to the rotation: a day shift, a night
/// shift, a rest day, or `Blank` for dates explicitly marked as untracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    WorkDay,
    WorkNight,
    Off,
    Blank,
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkDay => "work_day",
            Self::WorkNight => "work_night",
            Self::Off => "off",
            Self::Blank => "blank",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "work_day" => Ok(Self::WorkDay),
            "work_night" => Ok(Self::WorkNight),
            "off" => Ok(Self::Off),
            "blank" => Ok(Self::Blank),
            _ => Err(CoreError::InvalidData(format!("unknown work type: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentKind {
    Education,
    Study,
    Personal,
    Sleep,
    Activity,
}

impl CommitmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Education => "education",
            Self::Study => "study",
            Self::Personal => "personal",
            Self::Sleep => "sleep",
            Self::Activity => "activity",
        }
    }

    /// Study-like kinds are the ones scheduling constraints about "study"
    /// apply to, and the ones counted as study hours by the stats engine.
    pub fn is_study_like(&self) -> bool {
        matches!(self, Self::Education | Self::Study)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentStatus {
    Active,
    Queued,
    Paused,
    Completed,
    Cancelled,
}

impl CommitmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Queued => "queued",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    Proposed,
    Approved,
    Rejected,
}

impl MutationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "proposed" => Ok(Self::Proposed),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CoreError::InvalidData(format!("unknown mutation status: {s}"))),
        }
    }
}

/// Effective subscription tier, read from outside the core. Only used for
/// thin feature gates; billing itself is an external concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Pro,
    Trial,
    Admin,
}

impl Tier {
    pub fn can_plan_leave(&self) -> bool {
        !matches!(self, Self::Free)
    }
}

/// Slots a commitment is allowed to occupy: full rest days, or the evening
/// after a day shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudySlot {
    Off,
    WorkDayEvening,
}

impl StudySlot {
    /// Whether a day of the given work type offers this slot.
    pub fn matches(&self, work_type: WorkType) -> bool {
        match self {
            Self::Off => work_type == WorkType::Off,
            Self::WorkDayEvening => work_type == WorkType::WorkDay,
        }
    }
}
