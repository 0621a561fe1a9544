use chrono::NaiveDate;

use rotaplan_core::{
    compute_state_hash,
    constraint::{Constraint, ConstraintRule},
    cycle::{Cycle, CycleBlock},
    ids::{ConstraintId, CycleId},
    types::{CommitmentKind, CommitmentStatus, StudySlot, WorkType},
};
use rotaplan_engine::generate::{apply_commitments, generate};
use rotaplan_engine::Command;
use rotaplan_harness::TestPeer;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn standard_cycle() -> Cycle {
    Cycle {
        id: CycleId::new(),
        name: "5-5-5".into(),
        pattern: vec![
            CycleBlock { work_type: WorkType::WorkDay, duration_days: 5 },
            CycleBlock { work_type: WorkType::WorkNight, duration_days: 5 },
            CycleBlock { work_type: WorkType::Off, duration_days: 5 },
        ],
        anchor_date: date(2026, 1, 1),
        anchor_cycle_day: 4,
    }
}

// ============================================================================
// Calendar generation
// ============================================================================

#[test]
fn generated_days_follow_the_anchor() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    // Anchor date is cycle day 4, inside the work_day block.
    let anchor = peer.day(date(2026, 1, 1))?.unwrap();
    assert_eq!(anchor.cycle_day, 4);
    assert_eq!(anchor.work_type, WorkType::WorkDay);
    assert_eq!(anchor.state.available_hours, 4.0);

    let night = peer.day(date(2026, 1, 3))?.unwrap();
    assert_eq!(night.cycle_day, 6);
    assert_eq!(night.work_type, WorkType::WorkNight);
    assert_eq!(night.state.available_hours, 2.0);

    let off = peer.day(date(2026, 1, 8))?.unwrap();
    assert_eq!(off.cycle_day, 11);
    assert_eq!(off.work_type, WorkType::Off);
    assert_eq!(off.state.available_hours, 12.0);

    // One cycle later, same phase.
    let wrapped = peer.day(date(2026, 1, 16))?.unwrap();
    assert_eq!(wrapped.cycle_day, 4);
    assert_eq!(wrapped.work_type, WorkType::WorkDay);
    Ok(())
}

#[test]
fn generation_is_deterministic() {
    let cycle = standard_cycle();
    let leave = vec![TestPeer::leave("holiday", date(2026, 3, 1), date(2026, 3, 7))];

    let first = generate(date(2026, 1, 1), date(2026, 12, 31), &cycle, &leave);
    let second = generate(date(2026, 1, 1), date(2026, 12, 31), &cycle, &leave);

    assert_eq!(first, second);
    assert_eq!(first.len(), 365);
    assert_eq!(
        compute_state_hash(&first).unwrap(),
        compute_state_hash(&second).unwrap()
    );
}

#[test]
fn leave_days_are_tagged_at_generation() {
    let cycle = standard_cycle();
    let leave = vec![TestPeer::leave("holiday", date(2026, 2, 10), date(2026, 2, 20))];
    let days = generate(date(2026, 1, 1), date(2026, 12, 31), &cycle, &leave);

    for day in &days {
        let in_range = day.date >= date(2026, 2, 10) && day.date <= date(2026, 2, 20);
        assert_eq!(day.state.is_leave, in_range, "{}", day.date);
        if in_range {
            assert_eq!(day.state.available_hours, 16.0);
            assert_eq!(day.state.tags, vec!["leave".to_string()]);
        }
    }
}

// ============================================================================
// Commitment application
// ============================================================================

#[test]
fn commitments_land_on_eligible_days_only() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;
    peer.engine.execute(Command::AddCommitment {
        commitment: TestPeer::education("exam prep"),
    })?;

    let off = peer.day(date(2026, 1, 8))?.unwrap();
    assert_eq!(off.state.commitments.len(), 1);
    assert_eq!(off.state.commitments[0].name, "exam prep");
    assert_eq!(off.state.used_hours, 4.0);
    assert!(!off.state.is_overloaded);

    let work = peer.day(date(2026, 1, 1))?.unwrap();
    assert!(work.state.commitments.is_empty());
    assert_eq!(work.state.used_hours, 0.0);
    Ok(())
}

#[test]
fn overload_flag_matches_hours_exactly() {
    let cycle = standard_cycle();
    let mut days = generate(date(2026, 1, 1), date(2026, 1, 15), &cycle, &[]);

    let heavy_a = TestPeer::commitment(
        "course a",
        CommitmentKind::Education,
        CommitmentStatus::Active,
        vec![StudySlot::Off],
        8.0,
    );
    let heavy_b = TestPeer::commitment(
        "course b",
        CommitmentKind::Education,
        CommitmentStatus::Active,
        vec![StudySlot::Off],
        8.0,
    );

    let violations = apply_commitments(&mut days, &[heavy_a, heavy_b], &[]);

    for day in &days {
        assert_eq!(
            day.state.is_overloaded,
            day.state.used_hours > day.state.available_hours,
            "{}",
            day.date
        );
    }
    // Five off days at 16h used of 12h available.
    let overloaded: Vec<_> = days.iter().filter(|d| d.state.is_overloaded).collect();
    assert_eq!(overloaded.len(), 5);
    assert_eq!(violations.len(), 5);
    assert!(violations[0].reason.contains("overloaded"));
    assert!(violations[0].reason.contains("16h used of 12h available"));
}

#[test]
fn commitments_apply_in_caller_order() {
    let cycle = standard_cycle();
    let mut days = generate(date(2026, 1, 8), date(2026, 1, 8), &cycle, &[]);

    let first = TestPeer::education("first");
    let second = TestPeer::education("second");
    apply_commitments(&mut days, &[first, second], &[]);

    let names: Vec<&str> = days[0]
        .state
        .commitments
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn no_activity_constraint_suppresses_days() {
    let cycle = standard_cycle();
    let mut days = generate(date(2026, 1, 1), date(2026, 1, 15), &cycle, &[]);

    let no_study_on_off = Constraint {
        id: ConstraintId::new(),
        name: "rest_means_rest".into(),
        rule: ConstraintRule::NoActivityOn {
            activity: CommitmentKind::Study,
            work_types: vec![WorkType::Off],
        },
        hard: true,
        is_system: false,
        is_active: true,
    };

    apply_commitments(&mut days, &[TestPeer::education("blocked")], &[no_study_on_off]);
    assert!(days.iter().all(|d| d.state.commitments.is_empty()));
}

#[test]
fn evening_slot_matches_day_shifts() {
    let cycle = standard_cycle();
    let mut days = generate(date(2026, 1, 1), date(2026, 1, 15), &cycle, &[]);

    let evening = TestPeer::commitment(
        "evening class",
        CommitmentKind::Study,
        CommitmentStatus::Active,
        vec![StudySlot::WorkDayEvening],
        2.0,
    );
    apply_commitments(&mut days, &[evening], &[]);

    for day in &days {
        let expected = day.work_type == WorkType::WorkDay;
        assert_eq!(!day.state.commitments.is_empty(), expected, "{}", day.date);
    }
}

#[test]
fn inactive_commitments_are_skipped() {
    let cycle = standard_cycle();
    let mut days = generate(date(2026, 1, 8), date(2026, 1, 12), &cycle, &[]);

    let paused = TestPeer::commitment(
        "paused course",
        CommitmentKind::Education,
        CommitmentStatus::Paused,
        vec![StudySlot::Off],
        4.0,
    );
    let queued = TestPeer::commitment(
        "queued course",
        CommitmentKind::Education,
        CommitmentStatus::Queued,
        vec![StudySlot::Off],
        4.0,
    );
    apply_commitments(&mut days, &[paused, queued], &[]);
    assert!(days.iter().all(|d| d.state.commitments.is_empty()));
}
