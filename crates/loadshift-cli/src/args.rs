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

//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use loadshift_types::ScheduleStatus;

#[derive(Debug, Parser)]
#[command(name = "loadshift")]
#[command(author, version, about = "Schedule flexible loads into the cheapest price window")]
#[command(
    long_about = "Finds the cheapest contiguous window in day-ahead electricity prices and \
    keeps a durable record of device runs scheduled against it.\n\
    \nExamples:\n  \
    loadshift window --prices today.json --duration 2\n  \
    loadshift schedule --prices today.json --device switch.dishwasher --kwh 1.2 --duration 2\n  \
    loadshift list --status pending\n  \
    loadshift cancel 3f2c9a7e-..."
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, value_name = "PATH", default_value = "loadshift.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find the cheapest window without recording anything
    Window(WindowArgs),

    /// Pick the cheapest window for a device run and record it
    Schedule(ScheduleArgs),

    /// List recorded schedules, earliest window first
    List(ListArgs),

    /// Show a single schedule
    Show(IdArgs),

    /// Cancel a pending schedule
    Cancel(IdArgs),

    /// Mark a schedule as completed
    Complete(IdArgs),
}

#[derive(Debug, Parser)]
pub struct WindowArgs {
    /// JSON array of market prices (start, end, price_eur_per_mwh)
    #[arg(long, value_name = "PATH")]
    pub prices: PathBuf,

    /// Run length in hours
    #[arg(long)]
    pub duration: f64,

    /// Search horizon in hours from now [default: from config]
    #[arg(long)]
    pub within: Option<f64>,
}

#[derive(Debug, Parser)]
pub struct ScheduleArgs {
    /// JSON array of market prices (start, end, price_eur_per_mwh)
    #[arg(long, value_name = "PATH")]
    pub prices: PathBuf,

    /// Device reference, e.g. a Home Assistant entity id
    #[arg(long)]
    pub device: String,

    /// Expected consumption of the run in kWh
    #[arg(long)]
    pub kwh: f64,

    /// Run length in hours
    #[arg(long)]
    pub duration: f64,

    /// 1 (highest) to 5 (lowest), out-of-range values are clamped [default: from config]
    #[arg(long, allow_negative_numbers = true)]
    pub priority: Option<i64>,

    /// Search horizon in hours from now [default: from config]
    #[arg(long)]
    pub within: Option<f64>,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Only show schedules with this status (pending, cancelled, completed)
    #[arg(long)]
    pub status: Option<ScheduleStatus>,

    /// Maximum number of schedules [default: from config]
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Parser)]
pub struct IdArgs {
    /// Schedule id
    pub id: String,
}
