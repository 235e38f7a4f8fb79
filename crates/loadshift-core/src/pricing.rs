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

//! Conversion of day-ahead market quotes into timeline slots.

use chrono::{DateTime, FixedOffset, Utc};
use loadshift_types::PriceSlot;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One day-ahead market quote as published by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPrice {
    /// Interval start (ISO 8601 with explicit offset)
    pub start: DateTime<FixedOffset>,

    /// Interval end (ISO 8601 with explicit offset)
    pub end: DateTime<FixedOffset>,

    /// Price in EUR/MWh
    pub price_eur_per_mwh: f64,
}

pub fn eur_per_mwh_to_kwh(price_eur_per_mwh: f64) -> f64 {
    price_eur_per_mwh / 1000.0
}

/// Convert market quotes to slots ready for `PriceTimeline::set`.
///
/// Prices are converted to EUR/kWh, timestamps normalised to UTC and the
/// result sorted by start. Quotes with `end <= start` are dropped.
pub fn to_price_slots(prices: Vec<MarketPrice>) -> Vec<PriceSlot> {
    let total = prices.len();
    let mut slots: Vec<PriceSlot> = prices
        .into_iter()
        .filter_map(|quote| {
            let start = quote.start.with_timezone(&Utc);
            let end = quote.end.with_timezone(&Utc);
            if end <= start {
                warn!(%start, %end, "Dropping market price with empty interval");
                return None;
            }
            Some(PriceSlot::new(
                start,
                end,
                eur_per_mwh_to_kwh(quote.price_eur_per_mwh),
            ))
        })
        .collect();

    slots.sort_by_key(|slot| slot.start);
    debug!(
        received = total,
        kept = slots.len(),
        "Converted market prices"
    );
    slots
}
