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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Price Timeline Types =============

/// One interval of known or forecast price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSlot {
    /// Start of the interval (inclusive)
    pub start: DateTime<Utc>,

    /// End of the interval (exclusive)
    pub end: DateTime<Utc>,

    /// Price for this interval (EUR/kWh). May be negative.
    pub price_per_kwh: f64,
}

impl PriceSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, price_per_kwh: f64) -> Self {
        Self {
            start,
            end,
            price_per_kwh,
        }
    }

    /// Whether `time` falls inside `[start, end)`
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether this slot overlaps the half-open range `[from, to)`
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start < to && self.end > from
    }
}

/// Price statistics over a timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min_per_kwh: f64,
    pub max_per_kwh: f64,
    pub avg_per_kwh: f64,
}

/// Cheapest contiguous run window found in a price timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalWindow {
    /// Start of the first slot in the window
    pub start: DateTime<Utc>,

    /// End of the last slot in the window
    pub end: DateTime<Utc>,

    /// Arithmetic mean price of the window's slots (EUR/kWh)
    pub avg_price_per_kwh: f64,

    /// Price of the slot containing "now" minus `avg_price_per_kwh`, or 0 if "now" has no slot
    pub savings_vs_now: f64,

    /// Number of slots the window spans
    pub slot_count: usize,

    /// Slot duration inferred for this search, in minutes
    pub slot_duration_minutes: i64,
}

/// Cost estimate for running a specific device in the optimal window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceShiftSuggestion {
    /// Chosen window, `None` when no price data was usable
    pub window: Option<OptimalWindow>,

    /// Expected energy use of the run (kWh)
    pub consumption_kwh: f64,

    /// Cost when run inside the window (EUR)
    pub cost_optimal: f64,

    /// Cost when run immediately (EUR)
    pub cost_if_now: f64,

    /// `cost_if_now - cost_optimal` (EUR)
    pub estimated_savings: f64,

    /// Human-readable summary
    pub message: String,
}

impl DeviceShiftSuggestion {
    pub fn has_window(&self) -> bool {
        self.window.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn slot_at(hour: u32, price: f64) -> PriceSlot {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap();
        PriceSlot::new(start, start + Duration::hours(1), price)
    }

    #[test]
    fn test_slot_contains_is_half_open() {
        let slot = slot_at(10, 0.2);
        assert!(slot.contains(slot.start));
        assert!(slot.contains(slot.start + Duration::minutes(59)));
        assert!(!slot.contains(slot.end));
    }

    #[test]
    fn test_slot_overlaps() {
        let slot = slot_at(10, 0.2);
        assert!(slot.overlaps(slot.start - Duration::minutes(30), slot.start + Duration::minutes(1)));
        assert!(slot.overlaps(slot.start + Duration::minutes(30), slot.end + Duration::hours(5)));
        assert!(!slot.overlaps(slot.end, slot.end + Duration::hours(1)));
        assert!(!slot.overlaps(slot.start - Duration::hours(1), slot.start));
    }

    #[test]
    fn test_negative_price_serializes() {
        let slot = slot_at(13, -0.05);
        let json = serde_json::to_string(&slot).unwrap();
        let back: PriceSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
    }
}
