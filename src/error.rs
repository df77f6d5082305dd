// src/error.rs

use serde::Serialize;
use thiserror::Error;

use crate::slots::Day;
use crate::validate::ValidationError;

/// Structural failures. Any of these aborts the whole import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("workbook contains no sheets")]
    NoSheetFound,
    #[error("no header row found: the sheet is empty")]
    NoHeaderFound,
    #[error(transparent)]
    Decode(#[from] anyhow::Error),
}

/// Why a candidate course name was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameRejection {
    #[error("name is empty")]
    Empty,
    #[error("name is purely numeric")]
    Numeric,
    #[error("name is shorter than two characters")]
    TooShort,
    #[error("name is only whitespace or punctuation")]
    PunctuationOnly,
    #[error("name contains a time keyword")]
    TimeKeyword,
}

/// Why a block or record was skipped. Recorded, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidName {
        text: String,
        rejection: NameRejection,
    },
    UnresolvedPeriod {
        course: String,
    },
    Validation {
        course: String,
        errors: Vec<ValidationError>,
    },
}

/// An `InvalidCourseSkipped` event at one cell of the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub row: usize,
    pub column: usize,
    pub day: Day,
    pub reason: SkipReason,
}
