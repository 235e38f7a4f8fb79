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

//! In-memory price timeline shared between price refreshes and readers.

use chrono::{DateTime, Utc};
use loadshift_types::{PriceRange, PriceSlot};
use parking_lot::RwLock;
use tracing::info;

/// Current price timeline, replaced wholesale on every refresh.
///
/// Slots must be sorted ascending by `start` when handed to [`PriceTimeline::set`];
/// they are stored as-is.
#[derive(Debug, Default)]
pub struct PriceTimeline {
    slots: RwLock<Vec<PriceSlot>>,
}

impl PriceTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(slots: Vec<PriceSlot>) -> Self {
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Replace the whole timeline.
    pub fn set(&self, slots: Vec<PriceSlot>) {
        let count = slots.len();
        let first = slots.first().map(|s| s.start);
        let last = slots.last().map(|s| s.end);
        *self.slots.write() = slots;
        info!(slots = count, ?first, ?last, "Price timeline replaced");
    }

    /// Copy of the current slots.
    pub fn snapshot(&self) -> Vec<PriceSlot> {
        self.slots.read().clone()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Price of the slot containing `time`, if any
    pub fn price_at(&self, time: DateTime<Utc>) -> Option<f64> {
        self.slots
            .read()
            .iter()
            .find(|slot| slot.contains(time))
            .map(|slot| slot.price_per_kwh)
    }

    /// Min/max/avg over all slots, `None` when empty
    pub fn price_range(&self) -> Option<PriceRange> {
        let slots = self.slots.read();
        if slots.is_empty() {
            return None;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for slot in slots.iter() {
            min = min.min(slot.price_per_kwh);
            max = max.max(slot.price_per_kwh);
            sum += slot.price_per_kwh;
        }

        #[expect(clippy::cast_precision_loss)]
        let avg = sum / slots.len() as f64;

        Some(PriceRange {
            min_per_kwh: min,
            max_per_kwh: max,
            avg_per_kwh: avg,
        })
    }
}
