use chrono::NaiveDate;

use rotaplan_core::{
    calendar::CalendarDay,
    ids::{CommandId, MutationId, UserId},
    mutation::MutationRecord,
    settings::SettingsDoc,
    types::MutationStatus,
};

use crate::error::StorageError;

/// Settings document plus the optimistic-concurrency token it was read at.
#[derive(Debug, Clone)]
pub struct VersionedSettings {
    pub doc: SettingsDoc,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandLogStatus {
    Applied,
    Undone,
    Redone,
}

impl CommandLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Undone => "undone",
            Self::Redone => "redone",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StorageError> {
        match s {
            "applied" => Ok(Self::Applied),
            "undone" => Ok(Self::Undone),
            "redone" => Ok(Self::Redone),
            _ => Err(StorageError::Serialization(format!("unknown command status: {s}"))),
        }
    }
}

/// A logged command with full settings snapshots on both sides, the basis
/// for command-layer undo/redo.
#[derive(Debug, Clone)]
pub struct CommandLogEntry {
    pub seq: u64,
    pub command_id: CommandId,
    pub action: String,
    pub status: CommandLogStatus,
    pub before_state: SettingsDoc,
    pub after_state: SettingsDoc,
}

/// Persistence surface for the scheduling core. Every query is scoped to a
/// user id; foreign ids surface as not-found, never as another user's data.
pub trait Storage {
    // ==== Settings document ====

    fn get_settings(&self, user: UserId) -> Result<Option<VersionedSettings>, StorageError>;

    /// Writes the document if the stored version still equals
    /// `expected_version` (0 means "no document yet"). Returns the new
    /// version; a stale expectation fails with `VersionMismatch`.
    fn put_settings(
        &mut self,
        user: UserId,
        doc: &SettingsDoc,
        expected_version: u64,
    ) -> Result<u64, StorageError>;

    // ==== Calendar days ====

    fn upsert_days(&mut self, user: UserId, days: &[CalendarDay]) -> Result<(), StorageError>;

    fn get_days(
        &self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarDay>, StorageError>;

    fn get_all_days(&self, user: UserId) -> Result<Vec<CalendarDay>, StorageError>;

    fn get_day(&self, user: UserId, date: NaiveDate) -> Result<Option<CalendarDay>, StorageError>;

    fn delete_days(
        &mut self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, StorageError>;

    // ==== Mutations ====

    fn insert_mutation(&mut self, user: UserId, record: &MutationRecord) -> Result<(), StorageError>;

    fn get_mutation(
        &self,
        user: UserId,
        id: MutationId,
    ) -> Result<Option<MutationRecord>, StorageError>;

    /// Rewrites the full record (status column kept in sync).
    fn update_mutation(&mut self, user: UserId, record: &MutationRecord) -> Result<(), StorageError>;

    /// Conditional status transition; returns false when the stored status
    /// no longer matches `from` (a concurrent approval won the race).
    fn try_transition_mutation(
        &mut self,
        user: UserId,
        id: MutationId,
        from: MutationStatus,
        to: MutationStatus,
    ) -> Result<bool, StorageError>;

    fn list_mutations(
        &self,
        user: UserId,
        status: Option<MutationStatus>,
    ) -> Result<Vec<MutationRecord>, StorageError>;

    // ==== Snapshots ====

    /// Content-addressed insert; an existing snapshot with the same hash is
    /// left untouched.
    fn put_snapshot(
        &mut self,
        user: UserId,
        state_hash: &str,
        days: &[CalendarDay],
    ) -> Result<(), StorageError>;

    fn get_snapshot(
        &self,
        user: UserId,
        state_hash: &str,
    ) -> Result<Option<Vec<CalendarDay>>, StorageError>;

    // ==== Command log ====

    fn append_command(
        &mut self,
        user: UserId,
        command_id: CommandId,
        action: &str,
        before: &SettingsDoc,
        after: &SettingsDoc,
    ) -> Result<u64, StorageError>;

    fn latest_command_with_status(
        &self,
        user: UserId,
        status: CommandLogStatus,
    ) -> Result<Option<CommandLogEntry>, StorageError>;

    fn set_command_status(
        &mut self,
        user: UserId,
        seq: u64,
        status: CommandLogStatus,
    ) -> Result<(), StorageError>;
}
