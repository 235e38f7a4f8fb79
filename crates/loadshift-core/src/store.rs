// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of LoadShift.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! SQLite-backed storage for device schedules.
//!
//! Every call opens its own connection and runs in a single transaction that is
//! committed before the call returns. A mutex serialises calls within the process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use loadshift_types::{DeviceSchedule, ScheduleStatus};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, ScheduleError};

/// Default location of the schedule database
pub const DEFAULT_DB_PATH: &str = "./data/loadshift.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS device_schedules (
        id              TEXT PRIMARY KEY,
        device_ref      TEXT NOT NULL,
        consumption_kwh REAL NOT NULL,
        duration_hours  REAL NOT NULL,
        priority        INTEGER NOT NULL,
        window_start    TEXT NOT NULL,
        window_end      TEXT NOT NULL,
        estimated_cost  REAL NOT NULL,
        status          TEXT NOT NULL DEFAULT 'pending',
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_device_schedules_status
        ON device_schedules(status);
    CREATE INDEX IF NOT EXISTS idx_device_schedules_window_start
        ON device_schedules(window_start);";

const COLUMNS: &str = "id, device_ref, consumption_kwh, duration_hours, priority, window_start, \
                       window_end, estimated_cost, status, created_at, updated_at";

/// Caller-supplied fields of a new schedule
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchedule {
    pub device_ref: String,
    pub consumption_kwh: f64,
    pub duration_hours: f64,
    pub priority: u8,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub estimated_cost: f64,
}

#[derive(Debug)]
pub struct ScheduleStore {
    db_path: PathBuf,
    lock: Mutex<()>,
}

impl ScheduleStore {
    /// Open (or create) the schedule database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| ScheduleError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let store = Self {
            db_path,
            lock: Mutex::new(()),
        };
        store.connect()?.execute_batch(SCHEMA)?;
        info!(path = %store.db_path.display(), "Schedule store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Persist a new pending schedule.
    ///
    /// Non-finite numbers are rejected up front; SQLite would store them as NULL.
    pub fn create(&self, new: NewSchedule) -> Result<DeviceSchedule> {
        for (field, value) in [
            ("consumption_kwh", new.consumption_kwh),
            ("duration_hours", new.duration_hours),
            ("estimated_cost", new.estimated_cost),
        ] {
            if !value.is_finite() {
                return Err(ScheduleError::InvalidRequest(format!(
                    "{field} must be finite, got {value}"
                )));
            }
        }

        let _guard = self.lock.lock();
        let mut conn = self.connect()?;

        let now = Utc::now();
        let schedule = DeviceSchedule {
            id: Uuid::new_v4().to_string(),
            device_ref: new.device_ref,
            consumption_kwh: new.consumption_kwh,
            duration_hours: new.duration_hours,
            priority: new.priority,
            window_start: new.window_start,
            window_end: new.window_end,
            estimated_cost: new.estimated_cost,
            status: ScheduleStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let tx = conn.transaction()?;
        tx.execute(
            &format!("INSERT INTO device_schedules ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
            params![
                schedule.id,
                schedule.device_ref,
                schedule.consumption_kwh,
                schedule.duration_hours,
                schedule.priority,
                format_ts(schedule.window_start),
                format_ts(schedule.window_end),
                schedule.estimated_cost,
                schedule.status.as_str(),
                format_ts(schedule.created_at),
                format_ts(schedule.updated_at),
            ],
        )?;
        tx.commit()?;

        info!(
            id = %schedule.id,
            device = %schedule.device_ref,
            priority = schedule.priority,
            window_start = %schedule.window_start,
            "Schedule created"
        );
        Ok(schedule)
    }

    pub fn get(&self, id: &str) -> Result<DeviceSchedule> {
        let _guard = self.lock.lock();
        let conn = self.connect()?;
        select_one(&conn, id)?.ok_or_else(|| ScheduleError::NotFound(id.to_owned()))
    }

    /// Move a pending schedule to `cancelled`.
    ///
    /// Fails with `NotFound` for unknown ids and `NotPending` for schedules in
    /// any other state; neither case modifies the row.
    pub fn cancel(&self, id: &str) -> Result<DeviceSchedule> {
        let _guard = self.lock.lock();
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE device_schedules SET status = ?1, updated_at = ?2
             WHERE id = ?3 AND status = ?4",
            params![
                ScheduleStatus::Cancelled.as_str(),
                format_ts(Utc::now()),
                id,
                ScheduleStatus::Pending.as_str(),
            ],
        )?;

        if updated == 0 {
            // Dropping the transaction rolls it back
            return Err(match select_one(&tx, id)? {
                Some(existing) => ScheduleError::NotPending {
                    id: id.to_owned(),
                    status: existing.status,
                },
                None => ScheduleError::NotFound(id.to_owned()),
            });
        }

        let schedule = select_one(&tx, id)?.ok_or_else(|| ScheduleError::NotFound(id.to_owned()))?;
        tx.commit()?;

        info!(id, device = %schedule.device_ref, "Schedule cancelled");
        Ok(schedule)
    }

    /// Mark a schedule `completed`, whatever its current state.
    pub fn complete(&self, id: &str) -> Result<DeviceSchedule> {
        let _guard = self.lock.lock();
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE device_schedules SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                ScheduleStatus::Completed.as_str(),
                format_ts(Utc::now()),
                id
            ],
        )?;
        if updated == 0 {
            return Err(ScheduleError::NotFound(id.to_owned()));
        }

        let schedule = select_one(&tx, id)?.ok_or_else(|| ScheduleError::NotFound(id.to_owned()))?;
        tx.commit()?;

        info!(id, device = %schedule.device_ref, "Schedule completed");
        Ok(schedule)
    }

    /// Schedules ordered by `window_start`, optionally filtered by status.
    pub fn list(&self, status: Option<ScheduleStatus>, limit: usize) -> Result<Vec<DeviceSchedule>> {
        let _guard = self.lock.lock();
        let conn = self.connect()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = if let Some(status) = status {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM device_schedules WHERE status = ?1
                 ORDER BY window_start ASC, created_at ASC LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![status.as_str(), limit], ScheduleRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM device_schedules
                 ORDER BY window_start ASC, created_at ASC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit], ScheduleRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let schedules = rows
            .into_iter()
            .map(ScheduleRow::into_schedule)
            .collect::<Result<Vec<_>>>()?;
        debug!(?status, count = schedules.len(), "Listed schedules");
        Ok(schedules)
    }
}

fn select_one(conn: &Connection, id: &str) -> Result<Option<DeviceSchedule>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM device_schedules WHERE id = ?1"),
        params![id],
        ScheduleRow::from_row,
    )
    .optional()?
    .map(ScheduleRow::into_schedule)
    .transpose()
}

/// Fixed-width UTC text so lexical order matches time order
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ScheduleError::CorruptRow(format!("{column} '{value}': {e}")))
}

/// Raw column values, validated by `into_schedule`
struct ScheduleRow {
    id: String,
    device_ref: String,
    consumption_kwh: f64,
    duration_hours: f64,
    priority: i64,
    window_start: String,
    window_end: String,
    estimated_cost: f64,
    status: String,
    created_at: String,
    updated_at: String,
}

impl ScheduleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            device_ref: row.get(1)?,
            consumption_kwh: row.get(2)?,
            duration_hours: row.get(3)?,
            priority: row.get(4)?,
            window_start: row.get(5)?,
            window_end: row.get(6)?,
            estimated_cost: row.get(7)?,
            status: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_schedule(self) -> Result<DeviceSchedule> {
        let priority = u8::try_from(self.priority).map_err(|_| {
            ScheduleError::CorruptRow(format!("priority {} of {}", self.priority, self.id))
        })?;
        let status = self
            .status
            .parse::<ScheduleStatus>()
            .map_err(|e| ScheduleError::CorruptRow(format!("{} of {}", e, self.id)))?;

        Ok(DeviceSchedule {
            window_start: parse_ts("window_start", &self.window_start)?,
            window_end: parse_ts("window_end", &self.window_end)?,
            created_at: parse_ts("created_at", &self.created_at)?,
            updated_at: parse_ts("updated_at", &self.updated_at)?,
            id: self.id,
            device_ref: self.device_ref,
            consumption_kwh: self.consumption_kwh,
            duration_hours: self.duration_hours,
            priority,
            estimated_cost: self.estimated_cost,
            status,
        })
    }
}
