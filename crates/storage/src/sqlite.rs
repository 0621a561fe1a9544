use chrono::NaiveDate;
use rusqlite::Connection;

use rotaplan_core::{
    calendar::{CalendarDay, DayState},
    ids::{CommandId, MutationId, UserId},
    mutation::MutationRecord,
    settings::SettingsDoc,
    types::{MutationStatus, WorkType},
};

use crate::error::StorageError;
use crate::traits::{CommandLogEntry, CommandLogStatus, Storage, VersionedSettings};

fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, StorageError> {
    serde_json::from_str(s).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn parse_date(s: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| StorageError::Serialization(format!("invalid date {s}: {e}")))
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn read_day(row: &rusqlite::Row) -> Result<CalendarDay, StorageError> {
    let date_str: String = row.get(0)?;
    let cycle_day: u32 = row.get(1)?;
    let work_type_str: String = row.get(2)?;
    let state_json: String = row.get(3)?;

    let state: DayState = from_json(&state_json)?;
    Ok(CalendarDay {
        date: parse_date(&date_str)?,
        cycle_day,
        work_type: WorkType::parse(&work_type_str)?,
        state,
    })
}

fn read_mutation(blob: &[u8]) -> Result<MutationRecord, StorageError> {
    rmp_serde::from_slice(blob).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn read_command(row: &rusqlite::Row) -> Result<CommandLogEntry, StorageError> {
    let seq: u64 = row.get(0)?;
    let command_id_bytes: Vec<u8> = row.get(1)?;
    let action: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    let before_json: String = row.get(4)?;
    let after_json: String = row.get(5)?;

    Ok(CommandLogEntry {
        seq,
        command_id: CommandId::from_bytes(to_array::<16>(command_id_bytes, "command_id")?),
        action,
        status: CommandLogStatus::parse(&status_str)?,
        before_state: from_json(&before_json)?,
        after_state: from_json(&after_json)?,
    })
}

impl Storage for SqliteStorage {
    fn get_settings(&self, user: UserId) -> Result<Option<VersionedSettings>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT doc, version FROM settings WHERE user_id = ?1")?;
        let mut rows = stmt.query(rusqlite::params![user.as_bytes().as_slice()])?;
        match rows.next()? {
            Some(row) => {
                let doc_json: String = row.get(0)?;
                let version: u64 = row.get(1)?;
                Ok(Some(VersionedSettings { doc: from_json(&doc_json)?, version }))
            }
            None => Ok(None),
        }
    }

    fn put_settings(
        &mut self,
        user: UserId,
        doc: &SettingsDoc,
        expected_version: u64,
    ) -> Result<u64, StorageError> {
        let doc_json = to_json(doc)?;

        let changed = if expected_version == 0 {
            self.conn.execute(
                "INSERT OR IGNORE INTO settings (user_id, doc, version) VALUES (?1, ?2, 1)",
                rusqlite::params![user.as_bytes().as_slice(), doc_json],
            )?
        } else {
            self.conn.execute(
                "UPDATE settings SET doc = ?1, version = version + 1, updated_at = unixepoch()
                 WHERE user_id = ?2 AND version = ?3",
                rusqlite::params![doc_json, user.as_bytes().as_slice(), expected_version],
            )?
        };

        if changed == 0 {
            let actual: u64 = self
                .conn
                .query_row(
                    "SELECT version FROM settings WHERE user_id = ?1",
                    rusqlite::params![user.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .unwrap_or(0);
            return Err(StorageError::VersionMismatch { expected: expected_version, actual });
        }
        Ok(expected_version + 1)
    }

    fn upsert_days(&mut self, user: UserId, days: &[CalendarDay]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO calendar_days (user_id, date, cycle_day, work_type, state, manual_override)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (user_id, date) DO UPDATE SET
                     cycle_day = excluded.cycle_day,
                     work_type = excluded.work_type,
                     state = excluded.state,
                     manual_override = excluded.manual_override",
            )?;
            for day in days {
                stmt.execute(rusqlite::params![
                    user.as_bytes().as_slice(),
                    day.date.to_string(),
                    day.cycle_day,
                    day.work_type.as_str(),
                    to_json(&day.state)?,
                    day.state.manual_override,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_days(
        &self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarDay>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, cycle_day, work_type, state FROM calendar_days
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date",
        )?;
        let mut rows = stmt.query(rusqlite::params![
            user.as_bytes().as_slice(),
            start.to_string(),
            end.to_string(),
        ])?;
        let mut days = Vec::new();
        while let Some(row) = rows.next()? {
            days.push(read_day(row)?);
        }
        Ok(days)
    }

    fn get_all_days(&self, user: UserId) -> Result<Vec<CalendarDay>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, cycle_day, work_type, state FROM calendar_days
             WHERE user_id = ?1 ORDER BY date",
        )?;
        let mut rows = stmt.query(rusqlite::params![user.as_bytes().as_slice()])?;
        let mut days = Vec::new();
        while let Some(row) = rows.next()? {
            days.push(read_day(row)?);
        }
        Ok(days)
    }

    fn get_day(&self, user: UserId, date: NaiveDate) -> Result<Option<CalendarDay>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, cycle_day, work_type, state FROM calendar_days
             WHERE user_id = ?1 AND date = ?2",
        )?;
        let mut rows = stmt.query(rusqlite::params![
            user.as_bytes().as_slice(),
            date.to_string(),
        ])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_day(row)?)),
            None => Ok(None),
        }
    }

    fn delete_days(
        &mut self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM calendar_days WHERE user_id = ?1 AND date >= ?2 AND date <= ?3",
            rusqlite::params![
                user.as_bytes().as_slice(),
                start.to_string(),
                end.to_string(),
            ],
        )?;
        Ok(deleted)
    }

    fn insert_mutation(&mut self, user: UserId, record: &MutationRecord) -> Result<(), StorageError> {
        let blob = rmp_serde::to_vec(record).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO mutations (mutation_id, user_id, status, record) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                record.id.as_bytes().as_slice(),
                user.as_bytes().as_slice(),
                record.status.as_str(),
                blob,
            ],
        )?;
        Ok(())
    }

    fn get_mutation(
        &self,
        user: UserId,
        id: MutationId,
    ) -> Result<Option<MutationRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT record FROM mutations WHERE user_id = ?1 AND mutation_id = ?2",
        )?;
        let mut rows = stmt.query(rusqlite::params![
            user.as_bytes().as_slice(),
            id.as_bytes().as_slice(),
        ])?;
        match rows.next()? {
            Some(row) => {
                let blob: Vec<u8> = row.get(0)?;
                Ok(Some(read_mutation(&blob)?))
            }
            None => Ok(None),
        }
    }

    fn update_mutation(&mut self, user: UserId, record: &MutationRecord) -> Result<(), StorageError> {
        let blob = rmp_serde::to_vec(record).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let changed = self.conn.execute(
            "UPDATE mutations SET status = ?1, record = ?2 WHERE user_id = ?3 AND mutation_id = ?4",
            rusqlite::params![
                record.status.as_str(),
                blob,
                user.as_bytes().as_slice(),
                record.id.as_bytes().as_slice(),
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("mutation {}", record.id)));
        }
        Ok(())
    }

    fn try_transition_mutation(
        &mut self,
        user: UserId,
        id: MutationId,
        from: MutationStatus,
        to: MutationStatus,
    ) -> Result<bool, StorageError> {
        let changed = self.conn.execute(
            "UPDATE mutations SET status = ?1
             WHERE user_id = ?2 AND mutation_id = ?3 AND status = ?4",
            rusqlite::params![
                to.as_str(),
                user.as_bytes().as_slice(),
                id.as_bytes().as_slice(),
                from.as_str(),
            ],
        )?;
        Ok(changed == 1)
    }

    fn list_mutations(
        &self,
        user: UserId,
        status: Option<MutationStatus>,
    ) -> Result<Vec<MutationRecord>, StorageError> {
        let mut records = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = self.conn.prepare(
                    "SELECT record FROM mutations WHERE user_id = ?1 AND status = ?2 ORDER BY rowid",
                )?;
                let mut rows = stmt.query(rusqlite::params![
                    user.as_bytes().as_slice(),
                    status.as_str(),
                ])?;
                while let Some(row) = rows.next()? {
                    let blob: Vec<u8> = row.get(0)?;
                    records.push(read_mutation(&blob)?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT record FROM mutations WHERE user_id = ?1 ORDER BY rowid",
                )?;
                let mut rows = stmt.query(rusqlite::params![user.as_bytes().as_slice()])?;
                while let Some(row) = rows.next()? {
                    let blob: Vec<u8> = row.get(0)?;
                    records.push(read_mutation(&blob)?);
                }
            }
        }
        Ok(records)
    }

    fn put_snapshot(
        &mut self,
        user: UserId,
        state_hash: &str,
        days: &[CalendarDay],
    ) -> Result<(), StorageError> {
        let blob = rmp_serde::to_vec(days).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT OR IGNORE INTO snapshots (user_id, state_hash, days) VALUES (?1, ?2, ?3)",
            rusqlite::params![user.as_bytes().as_slice(), state_hash, blob],
        )?;
        Ok(())
    }

    fn get_snapshot(
        &self,
        user: UserId,
        state_hash: &str,
    ) -> Result<Option<Vec<CalendarDay>>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT days FROM snapshots WHERE user_id = ?1 AND state_hash = ?2",
        )?;
        let mut rows = stmt.query(rusqlite::params![user.as_bytes().as_slice(), state_hash])?;
        match rows.next()? {
            Some(row) => {
                let blob: Vec<u8> = row.get(0)?;
                let days: Vec<CalendarDay> = rmp_serde::from_slice(&blob)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(days))
            }
            None => Ok(None),
        }
    }

    fn append_command(
        &mut self,
        user: UserId,
        command_id: CommandId,
        action: &str,
        before: &SettingsDoc,
        after: &SettingsDoc,
    ) -> Result<u64, StorageError> {
        self.conn.execute(
            "INSERT INTO command_log (command_id, user_id, action, status, before_state, after_state)
             VALUES (?1, ?2, ?3, 'applied', ?4, ?5)",
            rusqlite::params![
                command_id.as_bytes().as_slice(),
                user.as_bytes().as_slice(),
                action,
                to_json(before)?,
                to_json(after)?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid() as u64)
    }

    fn latest_command_with_status(
        &self,
        user: UserId,
        status: CommandLogStatus,
    ) -> Result<Option<CommandLogEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, command_id, action, status, before_state, after_state
             FROM command_log WHERE user_id = ?1 AND status = ?2
             ORDER BY seq DESC LIMIT 1",
        )?;
        let mut rows = stmt.query(rusqlite::params![
            user.as_bytes().as_slice(),
            status.as_str(),
        ])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_command(row)?)),
            None => Ok(None),
        }
    }

    fn set_command_status(
        &mut self,
        user: UserId,
        seq: u64,
        status: CommandLogStatus,
    ) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "UPDATE command_log SET status = ?1 WHERE user_id = ?2 AND seq = ?3",
            rusqlite::params![status.as_str(), user.as_bytes().as_slice(), seq],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("command log entry {seq}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_version_check() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let user = UserId::new();
        let doc = SettingsDoc::default();

        assert_eq!(storage.put_settings(user, &doc, 0).unwrap(), 1);
        assert_eq!(storage.put_settings(user, &doc, 1).unwrap(), 2);

        // Stale expectation fails and reports the stored version.
        match storage.put_settings(user, &doc, 1) {
            Err(StorageError::VersionMismatch { expected: 1, actual: 2 }) => {}
            other => panic!("expected version mismatch, got {other:?}"),
        }

        // Another user's document is invisible.
        assert!(storage.get_settings(UserId::new()).unwrap().is_none());
    }

    #[test]
    fn settings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rota.db");
        let path = path.to_str().unwrap();
        let user = UserId::new();

        {
            let mut storage = SqliteStorage::open(path).unwrap();
            storage.put_settings(user, &SettingsDoc::default(), 0).unwrap();
        }

        let storage = SqliteStorage::open(path).unwrap();
        let loaded = storage.get_settings(user).unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.doc.constraints.len(), 3);
    }
}
