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

//! LoadShift core
//!
//! Finds the cheapest contiguous window in a day-ahead electricity price
//! timeline and keeps a durable record of device runs scheduled against it.
//!
//! ## Components
//!
//! - **PriceTimeline**: lock-protected, wholesale-replaced price slots
//! - **optimizer**: sliding-mean window search and device cost estimates
//! - **ScheduleStore**: SQLite-backed schedules with a pending/cancelled/completed state machine
//! - **SchedulingService**: the entry point tying the above together

pub mod error;
pub mod optimizer;
pub mod pricing;
pub mod service;
pub mod store;
pub mod timeline;

pub use error::{Result, ScheduleError};
pub use optimizer::{
    NoWindow, cheapest_window, find_optimal_window, suggest_device_shift,
    suggest_device_shift_within,
};
pub use pricing::{MarketPrice, eur_per_mwh_to_kwh, to_price_slots};
pub use service::{DEFAULT_LIST_LIMIT, SchedulingService};
pub use store::{DEFAULT_DB_PATH, NewSchedule, ScheduleStore};
pub use timeline::PriceTimeline;

pub use loadshift_types::{
    DeviceSchedule, DeviceShiftSuggestion, OptimalWindow, PriceRange, PriceSlot, ScheduleRequest,
    ScheduleStatus, clamp_priority,
};
