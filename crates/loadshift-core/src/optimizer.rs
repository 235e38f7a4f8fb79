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

//! Cheapest-window search over a price timeline snapshot.
//!
//! The search assumes one slot duration per call, inferred from the first two
//! slots inside the horizon. Timelines mixing slot lengths are only
//! approximated past the first change of length.

use chrono::{DateTime, Duration, Utc};
use loadshift_types::{DeviceShiftSuggestion, OptimalWindow, PriceSlot};
use thiserror::Error;
use tracing::debug;

/// Inferred slot durations are never shorter than this
pub const MIN_SLOT_DURATION_MINUTES: i64 = 15;

/// Slot duration assumed when fewer than two slots are in the horizon
pub const FALLBACK_SLOT_DURATION_MINUTES: i64 = 60;

/// Horizon used by [`suggest_device_shift`]
pub const DEFAULT_SHIFT_HORIZON_HOURS: f64 = 24.0;

// 100 years; keeps `now + horizon` inside chrono's range
const MAX_HOURS: f64 = 876_600.0;

/// Why no window could be found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoWindow {
    #[error("no price data available")]
    NoPriceData,

    #[error("no price data within the requested horizon")]
    NoDataInHorizon,

    #[error("horizon holds {available} slots but the run needs {needed}")]
    HorizonTooShort { needed: usize, available: usize },

    #[error("price data within the horizon holds a non-finite price")]
    NonFinitePrice,
}

/// Convert fractional hours to a duration. Negative or NaN input yields zero.
pub fn hours_to_duration(hours: f64) -> Duration {
    if hours.is_nan() || hours <= 0.0 {
        return Duration::zero();
    }
    #[expect(clippy::cast_possible_truncation)]
    let millis = (hours.min(MAX_HOURS) * 3_600_000.0).round() as i64;
    Duration::milliseconds(millis)
}

/// Find the cheapest contiguous window of `duration_hours` within
/// `[now, now + within_hours)`.
pub fn find_optimal_window(
    slots: &[PriceSlot],
    duration_hours: f64,
    within_hours: f64,
    now: DateTime<Utc>,
) -> Result<OptimalWindow, NoWindow> {
    if slots.is_empty() {
        return Err(NoWindow::NoPriceData);
    }

    let horizon_end = now
        .checked_add_signed(hours_to_duration(within_hours))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let in_horizon: Vec<&PriceSlot> = slots
        .iter()
        .filter(|slot| slot.overlaps(now, horizon_end))
        .collect();

    if in_horizon.is_empty() {
        return Err(NoWindow::NoDataInHorizon);
    }
    if in_horizon.iter().any(|slot| !slot.price_per_kwh.is_finite()) {
        return Err(NoWindow::NonFinitePrice);
    }

    let slot_duration = match in_horizon.as_slice() {
        [first, second, ..] => {
            (second.start - first.start).max(Duration::minutes(MIN_SLOT_DURATION_MINUTES))
        }
        _ => Duration::minutes(FALLBACK_SLOT_DURATION_MINUTES),
    };
    let needed = slots_needed(duration_hours, slot_duration);

    let prices: Vec<f64> = in_horizon.iter().map(|slot| slot.price_per_kwh).collect();
    let Some((first_index, avg_price)) = cheapest_window(&prices, needed) else {
        return Err(NoWindow::HorizonTooShort {
            needed,
            available: in_horizon.len(),
        });
    };

    let first = in_horizon[first_index];
    let last = in_horizon[first_index + needed - 1];

    let savings_vs_now = in_horizon
        .iter()
        .find(|slot| slot.contains(now))
        .map_or(0.0, |slot| slot.price_per_kwh - avg_price);

    debug!(
        candidates = in_horizon.len(),
        slot_minutes = slot_duration.num_minutes(),
        needed,
        start = %first.start,
        avg_price,
        "Optimal window found"
    );

    Ok(OptimalWindow {
        start: first.start,
        end: last.end,
        avg_price_per_kwh: avg_price,
        savings_vs_now,
        slot_count: needed,
        slot_duration_minutes: slot_duration.num_minutes(),
    })
}

/// Number of slots covering `duration_hours`, rounded to nearest, at least one
fn slots_needed(duration_hours: f64, slot_duration: Duration) -> usize {
    #[expect(clippy::cast_precision_loss)]
    let slot_hours = slot_duration.num_seconds() as f64 / 3600.0;
    let ratio = (duration_hours / slot_hours).round();
    if ratio.is_nan() || ratio < 1.0 {
        return 1;
    }
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let needed = ratio as usize;
    needed.max(1)
}

/// Fixed-point resolution of window sums: 1e-9 EUR/kWh
const PRICE_UNITS_PER_EUR: f64 = 1_000_000_000.0;

/// Start index and mean of the cheapest run of `width` consecutive prices.
///
/// The running sum is kept in integer price units (add the entering price,
/// subtract the leaving one), so equal windows anywhere in the timeline have
/// equal sums. Only a strictly lower sum replaces the current best, so the
/// earliest window wins ties. Returns `None` when `width` is zero or exceeds
/// the number of prices.
pub fn cheapest_window(prices: &[f64], width: usize) -> Option<(usize, f64)> {
    if width == 0 || width > prices.len() {
        return None;
    }

    let units: Vec<i128> = prices.iter().map(|&price| to_price_units(price)).collect();

    let mut sum: i128 = units[..width].iter().sum();
    let mut best_index = 0;
    let mut best_sum = sum;

    for start in 1..=units.len() - width {
        sum += units[start + width - 1] - units[start - 1];
        if sum < best_sum {
            best_sum = sum;
            best_index = start;
        }
    }

    #[expect(clippy::cast_precision_loss)]
    let avg = best_sum as f64 / (PRICE_UNITS_PER_EUR * width as f64);
    Some((best_index, avg))
}

/// Saturates for out-of-range input; callers reject non-finite prices first
#[expect(clippy::cast_possible_truncation)]
fn to_price_units(price: f64) -> i128 {
    i128::from((price * PRICE_UNITS_PER_EUR).round() as i64)
}

/// Cost estimate for running a device in the cheapest window of the next 24 hours
pub fn suggest_device_shift(
    slots: &[PriceSlot],
    consumption_kwh: f64,
    duration_hours: f64,
    now: DateTime<Utc>,
) -> DeviceShiftSuggestion {
    suggest_device_shift_within(
        slots,
        consumption_kwh,
        duration_hours,
        DEFAULT_SHIFT_HORIZON_HOURS,
        now,
    )
}

/// Same as [`suggest_device_shift`] with an explicit horizon
pub fn suggest_device_shift_within(
    slots: &[PriceSlot],
    consumption_kwh: f64,
    duration_hours: f64,
    within_hours: f64,
    now: DateTime<Utc>,
) -> DeviceShiftSuggestion {
    match find_optimal_window(slots, duration_hours, within_hours, now) {
        Ok(window) => {
            let cost_optimal = window.avg_price_per_kwh * consumption_kwh;
            let cost_if_now = (window.avg_price_per_kwh + window.savings_vs_now) * consumption_kwh;
            let estimated_savings = cost_if_now - cost_optimal;
            let message = format!(
                "Run between {} and {} at {:.4} EUR/kWh average (saves {:.2} EUR vs running now)",
                window.start.format("%Y-%m-%d %H:%M UTC"),
                window.end.format("%Y-%m-%d %H:%M UTC"),
                window.avg_price_per_kwh,
                estimated_savings
            );
            DeviceShiftSuggestion {
                window: Some(window),
                consumption_kwh,
                cost_optimal,
                cost_if_now,
                estimated_savings,
                message,
            }
        }
        Err(reason) => DeviceShiftSuggestion {
            window: None,
            consumption_kwh,
            cost_optimal: 0.0,
            cost_if_now: 0.0,
            estimated_savings: 0.0,
            message: format!("Cannot optimise: {reason}; run now"),
        },
    }
}
