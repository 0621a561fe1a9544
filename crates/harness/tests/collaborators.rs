use chrono::NaiveDate;

use rotaplan_core::{
    change::Intent,
    ids::UserId,
    types::{MutationStatus, Tier},
};
use rotaplan_engine::{
    interpret, CommandParser, Engine, Notifier, NotifyError, Parsed, ParseError,
};
use rotaplan_harness::TestPeer;
use rotaplan_storage::SqliteStorage;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Command parser fallback
// ============================================================================

struct UnreachableParser;

impl CommandParser for UnreachableParser {
    fn parse(&self, _text: &str, _context: &serde_json::Value) -> Result<Parsed, ParseError> {
        Err(ParseError::Unavailable("connection refused".into()))
    }
}

struct GarbledParser;

impl CommandParser for GarbledParser {
    fn parse(&self, _text: &str, _context: &serde_json::Value) -> Result<Parsed, ParseError> {
        Err(ParseError::Malformed("not an action object".into()))
    }
}

struct EchoParser;

impl CommandParser for EchoParser {
    fn parse(&self, text: &str, _context: &serde_json::Value) -> Result<Parsed, ParseError> {
        Ok(Parsed::Conversation(text.to_string()))
    }
}

#[test]
fn parser_failure_degrades_to_conversation() {
    let context = serde_json::json!({});

    for parser in [&UnreachableParser as &dyn CommandParser, &GarbledParser] {
        let Parsed::Conversation(text) = interpret(parser, "plan my leave", &context) else {
            panic!("expected a conversational fallback");
        };
        assert_eq!(
            text,
            "I couldn't work out a schedule change from that. Could you rephrase it?"
        );
    }
}

#[test]
fn working_parser_output_passes_through() {
    let parsed = interpret(&EchoParser, "hello", &serde_json::json!({}));
    let Parsed::Conversation(text) = parsed else {
        panic!("expected conversation");
    };
    assert_eq!(text, "hello");
}

// ============================================================================
// Notifier failure
// ============================================================================

struct DeadLetterNotifier;

impl Notifier for DeadLetterNotifier {
    fn notify(&self, _user: UserId, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError("smtp timeout".into()))
    }
}

#[test]
fn failing_notifier_never_aborts_the_mutation_flow() -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::new(SqliteStorage::open_in_memory()?, UserId::new(), Tier::Pro)
        .with_notifier(Box::new(DeadLetterNotifier));
    let mut peer = TestPeer { engine };
    peer.install_standard_cycle()?;

    let change = TestPeer::add_commitment_change(
        TestPeer::education("exam prep"),
        vec![date(2026, 1, 8)],
    );
    let proposed = peer.engine.propose_mutation(Intent::ScheduleCommitment, vec![change])?;

    // Approval and undo both notify; neither surfaces the delivery failure.
    let approved = peer.engine.approve_mutation(proposed.id)?;
    assert_eq!(approved.status, MutationStatus::Approved);
    assert_eq!(peer.day(date(2026, 1, 8))?.unwrap().state.commitments.len(), 1);

    let undone = peer.engine.undo_mutation(proposed.id)?;
    assert!(undone.undone);
    assert!(peer.day(date(2026, 1, 8))?.unwrap().state.commitments.is_empty());
    Ok(())
}
