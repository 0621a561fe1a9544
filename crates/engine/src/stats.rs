use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use rotaplan_core::{
    calendar::CalendarDay,
    commitment::Commitment,
    leave::LeaveBlock,
    types::WorkType,
};

const PEAK_WEEK_LIMIT: usize = 5;
const ZERO_RECOVERY_MIN_RUN: usize = 5;

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkTotals {
    pub work_days: u32,
    pub night_shifts: u32,
    pub off_days: u32,
    pub leave_days: u32,
    pub study_hours: f64,
    pub overloaded_days: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyBreakdown {
    pub month: u32,
    #[serde(flatten)]
    pub totals: WorkTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakWeek {
    /// ISO week label, e.g. "2026-W07".
    pub week: String,
    pub study_hours: f64,
}

/// A contiguous run of work days with no study scheduled.
#[derive(Debug, Clone, Serialize)]
pub struct RecoverySpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearlyStats {
    pub year: i32,
    #[serde(flatten)]
    pub totals: WorkTotals,
    pub monthly: Vec<MonthlyBreakdown>,
    pub peak_weeks: Vec<PeakWeek>,
    pub zero_recovery_spans: Vec<RecoverySpan>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub totals: WorkTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitmentStats {
    pub commitment_id: String,
    pub name: String,
    pub scheduled_days: u32,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadBucket {
    pub work_type: WorkType,
    pub days: u32,
    pub total_hours: f64,
    pub avg_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub today: NaiveDate,
    pub week_work_days: u32,
    pub week_night_shifts: u32,
    pub week_off_days: u32,
    pub active_commitments: u32,
    pub pending_proposals: u32,
    pub next_leave: Option<NaiveDate>,
}

fn day_study_hours(day: &CalendarDay) -> f64 {
    day.state
        .commitments
        .iter()
        .filter(|c| c.kind.is_study_like())
        .map(|c| c.hours)
        .sum()
}

fn tally(totals: &mut WorkTotals, day: &CalendarDay) {
    match day.work_type {
        WorkType::WorkDay => totals.work_days += 1,
        WorkType::WorkNight => totals.night_shifts += 1,
        WorkType::Off => totals.off_days += 1,
        WorkType::Blank => {}
    }
    if day.state.is_leave {
        totals.leave_days += 1;
    }
    if day.state.is_overloaded {
        totals.overloaded_days += 1;
    }
    totals.study_hours += day_study_hours(day);
}

/// Input ordering never matters: days are sorted before any bucketing.
fn sorted_days(days: &[CalendarDay]) -> Vec<&CalendarDay> {
    let mut sorted: Vec<&CalendarDay> = days.iter().collect();
    sorted.sort_by_key(|d| d.date);
    sorted
}

pub fn yearly_stats(days: &[CalendarDay], year: i32) -> YearlyStats {
    let sorted = sorted_days(days);
    let in_year: Vec<&CalendarDay> =
        sorted.into_iter().filter(|d| d.date.year() == year).collect();

    let mut totals = WorkTotals::default();
    let mut by_month: BTreeMap<u32, WorkTotals> = BTreeMap::new();
    let mut by_week: BTreeMap<String, f64> = BTreeMap::new();

    for day in &in_year {
        tally(&mut totals, day);
        tally(by_month.entry(day.date.month()).or_default(), day);

        let study = day_study_hours(day);
        if study > 0.0 {
            let iso = day.date.iso_week();
            let label = format!("{:04}-W{:02}", iso.year(), iso.week());
            *by_week.entry(label).or_default() += study;
        }
    }

    let monthly = by_month
        .into_iter()
        .map(|(month, totals)| MonthlyBreakdown { month, totals })
        .collect();

    let mut peak_weeks: Vec<PeakWeek> = by_week
        .into_iter()
        .map(|(week, study_hours)| PeakWeek { week, study_hours })
        .collect();
    peak_weeks.sort_by(|a, b| {
        b.study_hours
            .total_cmp(&a.study_hours)
            .then_with(|| a.week.cmp(&b.week))
    });
    peak_weeks.truncate(PEAK_WEEK_LIMIT);

    YearlyStats {
        year,
        totals,
        monthly,
        peak_weeks,
        zero_recovery_spans: zero_recovery_spans(&in_year),
    }
}

pub fn monthly_stats(days: &[CalendarDay], year: i32, month: u32) -> MonthlyStats {
    let mut totals = WorkTotals::default();
    for day in sorted_days(days) {
        if day.date.year() == year && day.date.month() == month {
            tally(&mut totals, day);
        }
    }
    MonthlyStats { year, month, totals }
}

pub fn commitment_stats(commitments: &[Commitment], days: &[CalendarDay]) -> Vec<CommitmentStats> {
    commitments
        .iter()
        .map(|commitment| {
            let mut scheduled_days = 0u32;
            let mut total_hours = 0.0f64;
            for day in days {
                for assigned in &day.state.commitments {
                    if assigned.commitment_id == commitment.id {
                        scheduled_days += 1;
                        total_hours += assigned.hours;
                    }
                }
            }
            CommitmentStats {
                commitment_id: commitment.id.to_string(),
                name: commitment.name.clone(),
                scheduled_days,
                total_hours,
            }
        })
        .collect()
}

pub fn load_distribution(days: &[CalendarDay]) -> Vec<LoadBucket> {
    [WorkType::Off, WorkType::WorkDay, WorkType::WorkNight]
        .into_iter()
        .map(|work_type| {
            let mut count = 0u32;
            let mut total_hours = 0.0f64;
            for day in days.iter().filter(|d| d.work_type == work_type) {
                count += 1;
                total_hours += day.state.used_hours;
            }
            let avg_hours = if count > 0 { total_hours / f64::from(count) } else { 0.0 };
            LoadBucket { work_type, days: count, total_hours, avg_hours }
        })
        .collect()
}

/// Dashboard summary around a caller-provided "today" so the computation
/// stays clock-free and testable.
pub fn dashboard_stats(
    days: &[CalendarDay],
    commitments: &[Commitment],
    leave_blocks: &[LeaveBlock],
    pending_proposals: u32,
    today: NaiveDate,
) -> DashboardStats {
    let week_end = today
        .checked_add_days(Days::new(6))
        .unwrap_or(NaiveDate::MAX);

    let mut week_work_days = 0;
    let mut week_night_shifts = 0;
    let mut week_off_days = 0;
    for day in days {
        if day.date < today || day.date > week_end {
            continue;
        }
        match day.work_type {
            WorkType::WorkDay => week_work_days += 1,
            WorkType::WorkNight => week_night_shifts += 1,
            WorkType::Off => week_off_days += 1,
            WorkType::Blank => {}
        }
    }

    let next_leave = leave_blocks
        .iter()
        .filter(|l| l.end_date >= today)
        .map(|l| l.start_date.max(today))
        .min();

    DashboardStats {
        today,
        week_work_days,
        week_night_shifts,
        week_off_days,
        active_commitments: commitments.iter().filter(|c| c.is_active()).count() as u32,
        pending_proposals,
        next_leave,
    }
}

/// Runs of consecutive work days (day or night) with no study commitment.
/// A run still open at the end of the list is closed there, never dropped.
pub fn zero_recovery_spans(days: &[&CalendarDay]) -> Vec<RecoverySpan> {
    let mut spans = Vec::new();
    let mut run: Vec<NaiveDate> = Vec::new();

    let mut close = |run: &mut Vec<NaiveDate>, spans: &mut Vec<RecoverySpan>| {
        if run.len() >= ZERO_RECOVERY_MIN_RUN {
            spans.push(RecoverySpan {
                start: run[0],
                end: run[run.len() - 1],
                length: run.len(),
            });
        }
        run.clear();
    };

    for day in days {
        let is_work = matches!(day.work_type, WorkType::WorkDay | WorkType::WorkNight);
        let has_study = day.state.commitments.iter().any(|c| c.kind.is_study_like());

        let contiguous = run
            .last()
            .is_none_or(|prev| prev.succ_opt() == Some(day.date));

        if is_work && !has_study && contiguous {
            run.push(day.date);
        } else {
            close(&mut run, &mut spans);
            if is_work && !has_study {
                run.push(day.date);
            }
        }
    }
    close(&mut run, &mut spans);

    spans
}
