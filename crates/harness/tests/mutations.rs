use chrono::NaiveDate;

use rotaplan_core::{
    change::{Change, Intent},
    compute_state_hash,
    types::MutationStatus,
};
use rotaplan_engine::{Command, EngineError};
use rotaplan_harness::TestPeer;
use rotaplan_storage::Storage;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Approve
// ============================================================================

#[test]
fn approve_applies_changes_and_records_hashes() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    let before_hash = compute_state_hash(
        &peer.engine.storage().get_all_days(peer.engine.user())?,
    )?;

    let change = TestPeer::add_commitment_change(
        TestPeer::education("exam prep"),
        vec![date(2026, 1, 8), date(2026, 1, 9)],
    );
    let proposed = peer.engine.propose_mutation(Intent::ScheduleCommitment, vec![change])?;
    assert_eq!(proposed.status, MutationStatus::Proposed);
    assert!(proposed.previous_state_hash.is_none());

    // Proposing alone changes nothing.
    let untouched = peer.day(date(2026, 1, 8))?.unwrap();
    assert!(untouched.state.commitments.is_empty());

    let approved = peer.engine.approve_mutation(proposed.id)?;
    assert_eq!(approved.status, MutationStatus::Approved);
    assert_eq!(approved.previous_state_hash.as_deref(), Some(before_hash.as_str()));

    let after_days = peer.engine.storage().get_all_days(peer.engine.user())?;
    let after_hash = compute_state_hash(&after_days)?;
    assert_eq!(approved.new_state_hash.as_deref(), Some(after_hash.as_str()));
    assert_ne!(approved.previous_state_hash, approved.new_state_hash);

    let day = peer.day(date(2026, 1, 8))?.unwrap();
    assert_eq!(day.state.commitments.len(), 1);
    assert_eq!(day.state.used_hours, 4.0);
    Ok(())
}

#[test]
fn approve_is_single_shot() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    let change = TestPeer::add_commitment_change(
        TestPeer::education("exam prep"),
        vec![date(2026, 1, 8)],
    );
    let proposed = peer.engine.propose_mutation(Intent::ScheduleCommitment, vec![change])?;
    peer.engine.approve_mutation(proposed.id)?;

    match peer.engine.approve_mutation(proposed.id) {
        Err(EngineError::InvalidMutationStatus { status, expected, .. }) => {
            assert_eq!(status, "approved");
            assert_eq!(expected, "proposed");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn approve_refuses_violating_proposals() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    // Study on a night shift is a hard violation.
    let change = TestPeer::add_commitment_change(
        TestPeer::education("night class"),
        vec![date(2026, 1, 3)],
    );
    let proposed = peer.engine.propose_mutation(Intent::ScheduleCommitment, vec![change])?;
    assert!(!proposed.violations.is_empty());

    assert!(matches!(
        peer.engine.approve_mutation(proposed.id),
        Err(EngineError::HasViolations(_))
    ));
    // Still proposed; rejection remains available.
    let record = peer.engine.mutation(proposed.id)?;
    assert_eq!(record.status, MutationStatus::Proposed);
    Ok(())
}

// ============================================================================
// Undo
// ============================================================================

#[test]
fn undo_restores_the_prior_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    let before_hash = compute_state_hash(
        &peer.engine.storage().get_all_days(peer.engine.user())?,
    )?;

    let change = TestPeer::add_commitment_change(
        TestPeer::education("exam prep"),
        vec![date(2026, 1, 8), date(2026, 1, 9), date(2026, 1, 10)],
    );
    let proposed = peer.engine.propose_mutation(Intent::ScheduleCommitment, vec![change])?;
    peer.engine.approve_mutation(proposed.id)?;

    let undone = peer.engine.undo_mutation(proposed.id)?;
    assert_eq!(undone.status, MutationStatus::Rejected);
    assert!(undone.undone);

    let restored = peer.engine.storage().get_all_days(peer.engine.user())?;
    assert_eq!(compute_state_hash(&restored)?, before_hash);
    let day = peer.day(date(2026, 1, 8))?.unwrap();
    assert!(day.state.commitments.is_empty());
    assert_eq!(day.state.used_hours, 0.0);

    // A second undo of the same mutation is refused.
    assert!(matches!(
        peer.engine.undo_mutation(proposed.id),
        Err(EngineError::InvalidMutationStatus { .. })
    ));
    Ok(())
}

#[test]
fn undo_requires_an_approved_mutation() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    let change = TestPeer::add_commitment_change(
        TestPeer::education("exam prep"),
        vec![date(2026, 1, 8)],
    );
    let proposed = peer.engine.propose_mutation(Intent::ScheduleCommitment, vec![change])?;

    match peer.engine.undo_mutation(proposed.id) {
        Err(EngineError::InvalidMutationStatus { status, expected, .. }) => {
            assert_eq!(status, "proposed");
            assert_eq!(expected, "approved");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    Ok(())
}

// ============================================================================
// Leave and removal semantics
// ============================================================================

#[test]
fn repeated_leave_application_stays_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    for _ in 0..2 {
        let leave = TestPeer::leave("holiday", date(2026, 2, 10), date(2026, 2, 20));
        let proposed = peer
            .engine
            .propose_mutation(Intent::PlanLeave, vec![Change::AddLeave { leave }])?;
        peer.engine.approve_mutation(proposed.id)?;
    }

    let day = peer.day(date(2026, 2, 15))?.unwrap();
    assert!(day.state.is_leave);
    assert_eq!(day.state.available_hours, 16.0);
    assert_eq!(day.state.tags, vec!["leave".to_string()]);
    Ok(())
}

#[test]
fn removing_a_commitment_resums_hours() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    let course = TestPeer::education("exam prep");
    let course_id = course.id;
    let add = peer.engine.propose_mutation(
        Intent::ScheduleCommitment,
        vec![TestPeer::add_commitment_change(course, vec![date(2026, 1, 8)])],
    )?;
    peer.engine.approve_mutation(add.id)?;
    assert_eq!(peer.day(date(2026, 1, 8))?.unwrap().state.used_hours, 4.0);

    let remove = peer.engine.propose_mutation(
        Intent::ScheduleCommitment,
        vec![Change::RemoveCommitment { commitment_id: course_id }],
    )?;
    peer.engine.approve_mutation(remove.id)?;

    let day = peer.day(date(2026, 1, 8))?.unwrap();
    assert!(day.state.commitments.is_empty());
    assert_eq!(day.state.used_hours, 0.0);
    assert!(!day.state.is_overloaded);
    Ok(())
}

// ============================================================================
// Reject
// ============================================================================

#[test]
fn reject_records_the_reason() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;

    let change = TestPeer::add_commitment_change(
        TestPeer::education("exam prep"),
        vec![date(2026, 1, 8)],
    );
    let proposed = peer.engine.propose_mutation(Intent::ScheduleCommitment, vec![change])?;
    let rejected = peer
        .engine
        .reject_mutation(proposed.id, Some("changed my mind"))?;

    assert_eq!(rejected.status, MutationStatus::Rejected);
    assert_eq!(rejected.explanation, "changed my mind");
    assert!(!rejected.undone);

    // Rejected proposals cannot be approved afterwards.
    assert!(matches!(
        peer.engine.approve_mutation(proposed.id),
        Err(EngineError::InvalidMutationStatus { .. })
    ));
    Ok(())
}

#[test]
fn mutation_listing_filters_by_status() -> Result<(), Box<dyn std::error::Error>> {
    let mut peer = TestPeer::new()?;
    peer.install_standard_cycle()?;
    peer.engine.execute(Command::AddCommitment {
        commitment: TestPeer::education("anatomy"),
    })?;

    let a = peer.engine.propose_mutation(
        Intent::ScheduleCommitment,
        vec![TestPeer::add_commitment_change(
            TestPeer::education("one"),
            vec![date(2026, 1, 8)],
        )],
    )?;
    let b = peer.engine.propose_mutation(
        Intent::ScheduleCommitment,
        vec![TestPeer::add_commitment_change(
            TestPeer::education("two"),
            vec![date(2026, 1, 9)],
        )],
    )?;
    peer.engine.approve_mutation(a.id)?;

    let proposed = peer.engine.list_mutations(Some(MutationStatus::Proposed))?;
    assert_eq!(proposed.len(), 1);
    assert_eq!(proposed[0].id, b.id);

    let all = peer.engine.list_mutations(None)?;
    assert_eq!(all.len(), 2);
    Ok(())
}
