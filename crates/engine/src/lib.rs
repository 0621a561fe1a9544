pub mod alternatives;
pub mod cache;
pub mod command;
pub mod error;
pub mod generate;
pub mod mutation;
pub mod notify;
pub mod parse;
pub mod stats;
pub mod validate;

pub use cache::TtlCache;
pub use command::{Command, OverrideDays, UpdateCycle};
pub use error::EngineError;
pub use notify::{Notifier, NotifyError};
pub use parse::{interpret, CommandParser, Parsed, ParseError};

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use rotaplan_core::{
    available_hours,
    calendar::{CalendarDay, DayState},
    change::{Change, Intent},
    compute_state_hash,
    ids::{AlternativeId, CommandId, MutationId, UserId},
    mutation::MutationRecord,
    settings::SettingsDoc,
    types::{MutationStatus, Tier, WorkType},
};
use rotaplan_storage::{
    CommandLogStatus, SqliteStorage, Storage, VersionedSettings,
};

use crate::notify::notify_best_effort;

/// Result of an `override_days` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideOutcome {
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct CommandOutcome {
    pub command_id: CommandId,
    pub seq: u64,
    pub action: &'static str,
    pub warnings: Vec<String>,
    pub regenerated_days: usize,
    pub override_result: Option<OverrideOutcome>,
}

/// Request-scoped orchestrator for one user's schedule. Holds no state
/// beyond its storage handle; every operation reads a full snapshot and
/// writes a new one, with optimistic versioning guarding the settings
/// document.
pub struct Engine {
    storage: SqliteStorage,
    user: UserId,
    tier: Tier,
    notifier: Option<Box<dyn Notifier>>,
}

impl Engine {
    pub fn new(storage: SqliteStorage, user: UserId, tier: Tier) -> Self {
        Self { storage, user, tier, notifier: None }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut SqliteStorage {
        &mut self.storage
    }

    /// Current settings document, or a fresh default (version 0, not yet
    /// persisted) for a new user.
    pub fn settings(&self) -> Result<VersionedSettings, EngineError> {
        Ok(self
            .storage
            .get_settings(self.user)?
            .unwrap_or_else(|| VersionedSettings { doc: SettingsDoc::default(), version: 0 }))
    }

    // ==== Command executor ====

    /// Validates and applies a command: settings transform under an
    /// optimistic version check, command log append, then calendar
    /// regeneration. `override_days` writes days directly and never
    /// regenerates; undo/redo restore logged snapshots and are not
    /// themselves logged.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, EngineError> {
        match command {
            Command::Undo => return self.undo_command(),
            Command::Redo => return self.redo_command(),
            _ => {}
        }

        let mut warnings = Vec::new();
        match &command {
            Command::AddLeave { leave } => {
                if !self.tier.can_plan_leave() {
                    return Err(EngineError::TierRequired("leave planning"));
                }
                let current = self.settings()?;
                for existing in &current.doc.leave_blocks {
                    if existing.overlaps(leave) {
                        warnings.push(format!(
                            "Leave '{}' overlaps existing leave '{}'",
                            leave.name, existing.name
                        ));
                    }
                }
            }
            Command::OverrideDays(o) => {
                if o.start_date > o.end_date {
                    return Err(EngineError::InvalidCommand(
                        "override start date is after end date".into(),
                    ));
                }
            }
            _ => {}
        }

        let versioned = self.settings()?;
        let before = versioned.doc.clone();
        let mut doc = versioned.doc;
        command.apply_to_settings(&mut doc)?;
        self.storage.put_settings(self.user, &doc, versioned.version)?;

        let command_id = CommandId::new();
        let action = command.action_name();
        let seq = self
            .storage
            .append_command(self.user, command_id, action, &before, &doc)?;

        let (regenerated_days, override_result) = match &command {
            Command::OverrideDays(o) => {
                let outcome = self.override_days(o, &doc)?;
                (0, Some(outcome))
            }
            _ => (self.regenerate(&doc)?, None),
        };

        tracing::info!(%command_id, action, regenerated_days, "command applied");
        Ok(CommandOutcome {
            command_id,
            seq,
            action,
            warnings,
            regenerated_days,
            override_result,
        })
    }

    /// Regenerates the calendar from the cycle anchor through the end of
    /// the following year, keeping manually overridden days verbatim apart
    /// from an informational cycle-day refresh.
    fn regenerate(&mut self, doc: &SettingsDoc) -> Result<usize, EngineError> {
        let Some(cycle) = &doc.cycle else {
            return Ok(0);
        };

        let start = cycle.anchor_date;
        let end = year_end(start.year() + 1)?;

        let mut days = generate::generate(start, end, cycle, &doc.leave_blocks);
        let overload = generate::apply_commitments(&mut days, &doc.commitments, &doc.constraints);
        if !overload.is_empty() {
            tracing::warn!(count = overload.len(), "regeneration produced overloaded days");
        }

        let existing = self.storage.get_days(self.user, start, end)?;
        let overridden: HashMap<NaiveDate, CalendarDay> = existing
            .into_iter()
            .filter(|d| d.state.manual_override)
            .map(|d| (d.date, d))
            .collect();
        for day in &mut days {
            if let Some(kept) = overridden.get(&day.date) {
                let cycle_day = day.cycle_day;
                *day = kept.clone();
                day.cycle_day = cycle_day;
            }
        }

        self.storage.delete_days(self.user, start, end)?;
        self.storage.upsert_days(self.user, &days)?;
        tracing::info!(
            days = days.len(),
            preserved = overridden.len(),
            "calendar regenerated"
        );
        Ok(days.len())
    }

    /// Bulk-sets a range to a fixed work type and marks every written day
    /// as a manual override, the terminal authority for those dates. With
    /// `preserve_off_days`, currently off days are left untouched and
    /// counted as skipped.
    fn override_days(
        &mut self,
        o: &OverrideDays,
        doc: &SettingsDoc,
    ) -> Result<OverrideOutcome, EngineError> {
        let mut written = Vec::new();
        let mut skipped = 0usize;

        let dates: Vec<NaiveDate> = o
            .start_date
            .iter_days()
            .take_while(|d| *d <= o.end_date)
            .collect();
        for date in dates {
            let existing = self.storage.get_day(self.user, date)?;

            if o.preserve_off_days
                && existing.as_ref().is_some_and(|d| d.work_type == WorkType::Off)
            {
                skipped += 1;
                continue;
            }

            let cycle_day = match (&doc.cycle, &existing) {
                (Some(cycle), _) => cycle.cycle_day_for(date),
                (None, Some(day)) => day.cycle_day,
                (None, None) => 0,
            };

            let mut state = existing
                .map(|d| d.state)
                .unwrap_or_else(|| DayState::empty(0.0));
            state.available_hours = available_hours(o.work_type, state.is_leave);
            state.manual_override = true;
            state.recompute_hours();

            written.push(CalendarDay { date, cycle_day, work_type: o.work_type, state });
        }

        let updated = written.len();
        self.storage.upsert_days(self.user, &written)?;
        tracing::info!(updated, skipped, "days overridden");
        Ok(OverrideOutcome { updated, skipped })
    }

    fn undo_command(&mut self) -> Result<CommandOutcome, EngineError> {
        let entry = self
            .storage
            .latest_command_with_status(self.user, CommandLogStatus::Applied)?
            .ok_or(EngineError::NothingToUndo)?;

        let versioned = self.settings()?;
        self.storage
            .put_settings(self.user, &entry.before_state, versioned.version)?;
        self.storage
            .set_command_status(self.user, entry.seq, CommandLogStatus::Undone)?;
        let regenerated_days = self.regenerate(&entry.before_state)?;

        tracing::info!(seq = entry.seq, action = %entry.action, "command undone");
        Ok(CommandOutcome {
            command_id: entry.command_id,
            seq: entry.seq,
            action: "undo",
            warnings: Vec::new(),
            regenerated_days,
            override_result: None,
        })
    }

    fn redo_command(&mut self) -> Result<CommandOutcome, EngineError> {
        let entry = self
            .storage
            .latest_command_with_status(self.user, CommandLogStatus::Undone)?
            .ok_or(EngineError::NothingToRedo)?;

        let versioned = self.settings()?;
        self.storage
            .put_settings(self.user, &entry.after_state, versioned.version)?;
        self.storage
            .set_command_status(self.user, entry.seq, CommandLogStatus::Redone)?;
        let regenerated_days = self.regenerate(&entry.after_state)?;

        tracing::info!(seq = entry.seq, action = %entry.action, "command redone");
        Ok(CommandOutcome {
            command_id: entry.command_id,
            seq: entry.seq,
            action: "redo",
            warnings: Vec::new(),
            regenerated_days,
            override_result: None,
        })
    }

    // ==== Mutation lifecycle ====

    /// Validates a proposal against current state and stores it as a
    /// proposed mutation. On failure the record carries violations plus any
    /// corrective alternatives; persisted calendar state is untouched.
    pub fn propose_mutation(
        &mut self,
        intent: Intent,
        changes: Vec<Change>,
    ) -> Result<MutationRecord, EngineError> {
        self.propose_internal(intent, changes, false, None)
    }

    /// Validation without persistence: the structured result including any
    /// warnings, which a stored mutation record does not carry.
    pub fn validate_proposal(
        &self,
        changes: &[Change],
    ) -> Result<rotaplan_core::mutation::ValidationResult, EngineError> {
        let settings = self.settings()?.doc;
        let days = self.storage.get_all_days(self.user)?;

        let mut result = validate::validate(changes, &days, &settings);
        if !result.is_valid {
            result.alternatives =
                alternatives::generate_alternatives(changes, &result.violations, &days, &settings);
        }
        Ok(result)
    }

    fn propose_internal(
        &mut self,
        intent: Intent,
        changes: Vec<Change>,
        is_alternative: bool,
        parent: Option<MutationId>,
    ) -> Result<MutationRecord, EngineError> {
        let result = self.validate_proposal(&changes)?;

        let record = MutationRecord {
            id: MutationId::new(),
            status: MutationStatus::Proposed,
            intent,
            changes,
            violations: result.violations,
            alternatives: result.alternatives,
            explanation: result.explanation,
            previous_state_hash: None,
            new_state_hash: None,
            undone: false,
            is_alternative,
            parent_mutation_id: parent,
        };
        self.storage.insert_mutation(self.user, &record)?;
        Ok(record)
    }

    fn require_mutation(&self, id: MutationId) -> Result<MutationRecord, EngineError> {
        self.storage
            .get_mutation(self.user, id)?
            .ok_or_else(|| EngineError::MutationNotFound(id.to_string()))
    }

    /// Applies an approved proposal: snapshot the prior state (addressed by
    /// its hash) before touching anything, then apply and record both
    /// hashes. A concurrent approval loses the conditional status
    /// transition and surfaces as a conflict.
    pub fn approve_mutation(&mut self, id: MutationId) -> Result<MutationRecord, EngineError> {
        let mut record = self.require_mutation(id)?;
        if record.status != MutationStatus::Proposed {
            return Err(EngineError::InvalidMutationStatus {
                mutation: id.to_string(),
                status: record.status.as_str(),
                expected: "proposed",
            });
        }
        if !record.violations.is_empty() {
            return Err(EngineError::HasViolations(id.to_string()));
        }

        let transitioned = self.storage.try_transition_mutation(
            self.user,
            id,
            MutationStatus::Proposed,
            MutationStatus::Approved,
        )?;
        if !transitioned {
            return Err(EngineError::ApprovalConflict(id.to_string()));
        }

        let days = self.storage.get_all_days(self.user)?;
        let previous_hash = compute_state_hash(&days)?;
        self.storage.put_snapshot(self.user, &previous_hash, &days)?;

        let new_days = mutation::apply_changes(&days, &record.changes);
        let new_hash = compute_state_hash(&new_days)?;
        self.storage.upsert_days(self.user, &new_days)?;

        record.status = MutationStatus::Approved;
        record.previous_state_hash = Some(previous_hash);
        record.new_state_hash = Some(new_hash);
        self.storage.update_mutation(self.user, &record)?;

        notify_best_effort(
            self.notifier.as_deref(),
            self.user,
            "Schedule change applied",
            &record.explanation,
        );
        tracing::info!(mutation = %id, "mutation approved");
        Ok(record)
    }

    pub fn reject_mutation(
        &mut self,
        id: MutationId,
        reason: Option<&str>,
    ) -> Result<MutationRecord, EngineError> {
        let mut record = self.require_mutation(id)?;
        if record.status != MutationStatus::Proposed {
            return Err(EngineError::InvalidMutationStatus {
                mutation: id.to_string(),
                status: record.status.as_str(),
                expected: "proposed",
            });
        }
        record.status = MutationStatus::Rejected;
        if let Some(reason) = reason {
            record.explanation = reason.to_string();
        }
        self.storage.update_mutation(self.user, &record)?;
        Ok(record)
    }

    /// Restores the pre-mutation snapshot wholesale. No diff inversion:
    /// snapshot restore stays correct even for non-invertible hour resums.
    /// The record lands in rejected with the undone flag set.
    pub fn undo_mutation(&mut self, id: MutationId) -> Result<MutationRecord, EngineError> {
        let mut record = self.require_mutation(id)?;
        if record.status != MutationStatus::Approved || record.undone {
            return Err(EngineError::InvalidMutationStatus {
                mutation: id.to_string(),
                status: if record.undone { "undone" } else { record.status.as_str() },
                expected: "approved",
            });
        }

        let previous_hash = record
            .previous_state_hash
            .clone()
            .ok_or_else(|| EngineError::SnapshotMissing(id.to_string()))?;
        let snapshot = self
            .storage
            .get_snapshot(self.user, &previous_hash)?
            .ok_or(EngineError::SnapshotMissing(previous_hash))?;

        self.storage.upsert_days(self.user, &snapshot)?;

        record.status = MutationStatus::Rejected;
        record.undone = true;
        self.storage.update_mutation(self.user, &record)?;

        notify_best_effort(
            self.notifier.as_deref(),
            self.user,
            "Schedule change undone",
            &record.explanation,
        );
        tracing::info!(mutation = %id, "mutation undone");
        Ok(record)
    }

    /// Spawns a fresh proposed mutation from one of a failed proposal's
    /// alternatives, linked back to its parent.
    pub fn select_alternative(
        &mut self,
        mutation_id: MutationId,
        alternative_id: AlternativeId,
    ) -> Result<MutationRecord, EngineError> {
        let record = self.require_mutation(mutation_id)?;
        let alternative = record
            .alternative(alternative_id)
            .ok_or_else(|| EngineError::AlternativeNotFound(alternative_id.to_string()))?
            .clone();

        self.propose_internal(
            record.intent,
            alternative.changes,
            true,
            Some(mutation_id),
        )
    }

    // ==== Queries ====

    pub fn calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarDay>, EngineError> {
        Ok(self.storage.get_days(self.user, start, end)?)
    }

    pub fn mutation(&self, id: MutationId) -> Result<MutationRecord, EngineError> {
        self.require_mutation(id)
    }

    pub fn list_mutations(
        &self,
        status: Option<MutationStatus>,
    ) -> Result<Vec<MutationRecord>, EngineError> {
        Ok(self.storage.list_mutations(self.user, status)?)
    }

    // ==== Stats ====

    pub fn yearly_stats(&self, year: i32) -> Result<stats::YearlyStats, EngineError> {
        let days = self.storage.get_all_days(self.user)?;
        Ok(stats::yearly_stats(&days, year))
    }

    pub fn monthly_stats(&self, year: i32, month: u32) -> Result<stats::MonthlyStats, EngineError> {
        let days = self.storage.get_all_days(self.user)?;
        Ok(stats::monthly_stats(&days, year, month))
    }

    pub fn commitment_stats(&self) -> Result<Vec<stats::CommitmentStats>, EngineError> {
        let settings = self.settings()?.doc;
        let days = self.storage.get_all_days(self.user)?;
        Ok(stats::commitment_stats(&settings.commitments, &days))
    }

    pub fn load_distribution(&self) -> Result<Vec<stats::LoadBucket>, EngineError> {
        let days = self.storage.get_all_days(self.user)?;
        Ok(stats::load_distribution(&days))
    }

    pub fn dashboard_stats(&self, today: NaiveDate) -> Result<stats::DashboardStats, EngineError> {
        let settings = self.settings()?.doc;
        let days = self.storage.get_all_days(self.user)?;
        let pending = self
            .storage
            .list_mutations(self.user, Some(MutationStatus::Proposed))?
            .len() as u32;
        Ok(stats::dashboard_stats(
            &days,
            &settings.commitments,
            &settings.leave_blocks,
            pending,
            today,
        ))
    }

    /// Compact settings summary handed to the command parser as context.
    /// Cached by the caller-owned TTL cache; one entry per user.
    pub fn parser_context(
        &self,
        cache: &mut TtlCache<UserId, serde_json::Value>,
    ) -> Result<serde_json::Value, EngineError> {
        if let Some(context) = cache.get(&self.user) {
            return Ok(context.clone());
        }

        let settings = self.settings()?.doc;
        let context = serde_json::json!({
            "cycle": settings.cycle.as_ref().map(|c| serde_json::json!({
                "name": c.name,
                "cycle_length": c.cycle_length(),
                "anchor_date": c.anchor_date,
            })),
            "commitments": settings.commitments.iter().map(|c| serde_json::json!({
                "id": c.id.to_string(),
                "name": c.name,
                "status": c.status,
            })).collect::<Vec<_>>(),
            "constraints": settings
                .active_constraints()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>(),
            "leave_blocks": settings.leave_blocks.len(),
        });
        cache.insert(self.user, context.clone());
        Ok(context)
    }
}

fn year_end(year: i32) -> Result<NaiveDate, EngineError> {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| EngineError::InvalidCommand(format!("year {year} out of range")))
}
