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

//! Error types for schedule storage and the scheduling service

use std::path::PathBuf;

use loadshift_types::ScheduleStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule {0} not found")]
    NotFound(String),

    #[error("schedule {id} is {status}, only pending schedules can be cancelled")]
    NotPending { id: String, status: ScheduleStatus },

    #[error("invalid schedule request: {0}")]
    InvalidRequest(String),

    #[error("failed to create database directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("corrupt schedule row: {0}")]
    CorruptRow(String),
}

impl ScheduleError {
    /// True for "never existed" as opposed to "already handled"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
