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

use std::path::Path;

use anyhow::{Context, Result, bail};
use loadshift_core::{DEFAULT_DB_PATH, DEFAULT_LIST_LIMIT};
use loadshift_types::{MAX_PRIORITY, MIN_PRIORITY};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadShiftConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub scheduling: SchedulingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingSettings {
    /// Search horizon used when `--within` is not given
    #[serde(default = "default_within_hours")]
    pub default_within_hours: f64,
    #[serde(default = "default_priority")]
    pub default_priority: i64,
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_owned()
}

fn default_within_hours() -> f64 {
    24.0
}

fn default_priority() -> i64 {
    3
}

fn default_list_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

fn default_log_filter() -> String {
    "loadshift=info".to_owned()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            default_within_hours: default_within_hours(),
            default_priority: default_priority(),
            list_limit: default_list_limit(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl LoadShiftConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    ///
    /// Called before the subscriber is installed, so the returned flag tells the
    /// caller whether defaults were used and should be reported.
    pub fn load_or_default(path: &Path) -> Result<(Self, bool)> {
        if path.exists() {
            Ok((Self::from_file(path)?, false))
        } else {
            Ok((Self::default(), true))
        }
    }

    fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            bail!("database.path must not be empty");
        }
        let within = self.scheduling.default_within_hours;
        if !within.is_finite() || within <= 0.0 {
            bail!("scheduling.default_within_hours must be positive, got {within}");
        }
        if self.scheduling.list_limit == 0 {
            bail!("scheduling.list_limit must be at least 1");
        }
        let priority = self.scheduling.default_priority;
        if !(i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)).contains(&priority) {
            bail!(
                "scheduling.default_priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {priority}"
            );
        }
        Ok(())
    }
}
