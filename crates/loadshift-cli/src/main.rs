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

mod args;
mod config;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use loadshift_core::{MarketPrice, PriceTimeline, ScheduleStore, SchedulingService, to_price_slots};
use loadshift_types::{PriceSlot, ScheduleRequest};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands, ListArgs, ScheduleArgs, WindowArgs};
use crate::config::LoadShiftConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, defaulted) = LoadShiftConfig::load_or_default(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if defaulted {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Window(args) => window(&config, &args),
        Commands::Schedule(args) => schedule(&config, &args),
        Commands::List(args) => list(&config, &args),
        Commands::Show(args) => print_json(&open_service(&config)?.get_schedule(&args.id)?),
        Commands::Cancel(args) => print_json(&open_service(&config)?.cancel_schedule(&args.id)?),
        Commands::Complete(args) => {
            print_json(&open_service(&config)?.complete_schedule(&args.id)?)
        }
    }
}

fn open_service(config: &LoadShiftConfig) -> Result<SchedulingService> {
    let store = ScheduleStore::open(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    Ok(SchedulingService::new(Arc::new(PriceTimeline::new()), store))
}

fn load_prices(path: &Path) -> Result<Vec<PriceSlot>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read price file: {}", path.display()))?;
    let prices: Vec<MarketPrice> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse price file: {}", path.display()))?;
    Ok(to_price_slots(prices))
}

fn window(config: &LoadShiftConfig, args: &WindowArgs) -> Result<()> {
    let timeline = PriceTimeline::with_slots(load_prices(&args.prices)?);
    let within = args
        .within
        .unwrap_or(config.scheduling.default_within_hours);

    let found =
        loadshift_core::find_optimal_window(&timeline.snapshot(), args.duration, within, Utc::now());
    let output = match found {
        Ok(window) => json!({
            "window": window,
            "prices": timeline.price_range(),
        }),
        Err(reason) => json!({
            "window": null,
            "reason": reason.to_string(),
            "prices": timeline.price_range(),
        }),
    };
    print_json(&output)
}

fn schedule(config: &LoadShiftConfig, args: &ScheduleArgs) -> Result<()> {
    let service = open_service(config)?;
    service.set_price_timeline(load_prices(&args.prices)?);

    let request = ScheduleRequest {
        device_ref: args.device.clone(),
        consumption_kwh: args.kwh,
        duration_hours: args.duration,
        priority: args.priority.unwrap_or(config.scheduling.default_priority),
        within_hours: args
            .within
            .unwrap_or(config.scheduling.default_within_hours),
    };
    print_json(&service.schedule_device(&request)?)
}

fn list(config: &LoadShiftConfig, args: &ListArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(config.scheduling.list_limit);
    print_json(&open_service(config)?.get_schedules(args.status, limit)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
