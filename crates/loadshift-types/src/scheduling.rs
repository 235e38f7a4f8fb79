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

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest priority
pub const MIN_PRIORITY: u8 = 1;

/// Lowest priority
pub const MAX_PRIORITY: u8 = 5;

/// Clamp a caller-supplied priority into `MIN_PRIORITY..=MAX_PRIORITY`
pub fn clamp_priority(priority: i64) -> u8 {
    let clamped = priority.clamp(i64::from(MIN_PRIORITY), i64::from(MAX_PRIORITY));
    u8::try_from(clamped).unwrap_or(MAX_PRIORITY)
}

// ============= Device Schedule State Machine =============

/// Lifecycle state of a device schedule
///
/// `Pending` is the only non-terminal state. `Cancelled` is reachable from
/// `Pending` only; `Completed` is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Cancelled,
    Completed,
}

impl ScheduleStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Cancelled, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown schedule status '{0}' (expected pending, cancelled or completed)")]
pub struct ParseStatusError(pub String);

impl FromStr for ScheduleStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_owned()))
    }
}

/// A persisted intent to run a device at a chosen time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSchedule {
    /// Unique id, generated at creation and never reused
    pub id: String,

    /// Caller-supplied device identifier (opaque)
    pub device_ref: String,

    pub consumption_kwh: f64,
    pub duration_hours: f64,

    /// 1 (highest) ..= 5 (lowest)
    pub priority: u8,

    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,

    /// `avg_price_per_kwh * consumption_kwh` for the chosen window (EUR)
    pub estimated_cost: f64,

    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller request for `ScheduleDevice`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub device_ref: String,
    pub consumption_kwh: f64,
    pub duration_hours: f64,

    /// Raw priority, clamped into 1..=5 when scheduled
    pub priority: i64,

    /// Search horizon from "now" (hours)
    pub within_hours: f64,
}
