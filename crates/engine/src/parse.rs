use thiserror::Error;

use crate::command::Command;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parser unavailable: {0}")]
    Unavailable(String),

    #[error("malformed parser output: {0}")]
    Malformed(String),
}

/// Parser output: either an executable command or conversational text to
/// relay back to the user.
#[derive(Debug, Clone)]
pub enum Parsed {
    Command { command: Command, explanation: String },
    Conversation(String),
}

/// Text-to-command oracle, typically backed by an LLM. Implementations
/// should construct commands through `Command::from_action` so unrecognized
/// actions are rejected before reaching the executor.
pub trait CommandParser {
    fn parse(&self, text: &str, context: &serde_json::Value) -> Result<Parsed, ParseError>;
}

/// Wraps a parser call so its failure degrades to a conversational fallback
/// instead of blocking command execution.
pub fn interpret(parser: &dyn CommandParser, text: &str, context: &serde_json::Value) -> Parsed {
    match parser.parse(text, context) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(error = %err, "command parsing failed, falling back to conversation");
            Parsed::Conversation(
                "I couldn't work out a schedule change from that. Could you rephrase it?".into(),
            )
        }
    }
}
