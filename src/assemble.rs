// src/assemble.rs

//! Matrix → course records. Drives header location, column mapping, cell
//! segmentation and field extraction, then validates every candidate.

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::{fs, path::Path};
use tracing::{debug, info, instrument, trace, warn};

use crate::cell::{segment_cell, FieldExtractor};
use crate::config::ImportConfig;
use crate::course::{Course, IdGenerator};
use crate::error::{Diagnostic, ImportError, SkipReason};
use crate::layout::{locate_header, map_day_columns, ColumnMap, HeaderInfo};
use crate::sheet::{reader_for_path, SpreadsheetReader};
use crate::slots::{cjk_numeral, Period, PERIOD_COUNT};
use crate::validate::{detect_conflicts, validate_course, ConflictPair};

static ROW_PERIOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第?(\d+)节?").expect("row period regex"));

/// Everything one import produced.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub header: HeaderInfo,
    pub columns: ColumnMap,
    pub courses: Vec<Course>,
    pub diagnostics: Vec<Diagnostic>,
    pub conflicts: Vec<ConflictPair>,
}

impl ImportReport {
    fn empty(header: HeaderInfo, columns: ColumnMap) -> Self {
        Self {
            header,
            columns,
            courses: Vec::new(),
            diagnostics: Vec::new(),
            conflicts: Vec::new(),
        }
    }
}

/// Default period for a data row.
///
/// Read from the period column when there is one and it is filled in:
/// `第3节`, `3` or a bare numeral such as `三`. A number outside 1..=12
/// leaves the row without a period. Otherwise the period is the row's
/// distance below the header, while that stays within 12.
pub fn resolve_row_period(row: &[String], row_index: usize, header: &HeaderInfo) -> Option<Period> {
    let label = header
        .period_column_index
        .and_then(|col| row.get(col))
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty());

    if let Some(label) = label {
        if let Some(digits) = ROW_PERIOD.captures(label).and_then(|c| c.get(1)) {
            return digits
                .as_str()
                .parse::<u8>()
                .ok()
                .and_then(Period::new);
        }
        let bare = label.trim_start_matches('第').trim_end_matches('节');
        if let Some(n) = cjk_numeral(bare) {
            return Period::new(n);
        }
        trace!(row = row_index, label, "unrecognised period label, using row offset");
    }

    let offset = row_index.checked_sub(header.header_row_index)?;
    if offset > usize::from(PERIOD_COUNT) {
        return None;
    }
    u8::try_from(offset).ok().and_then(Period::new)
}

/// Turn a cell matrix into validated course records.
///
/// Structural failures abort; everything else is recorded in the report's
/// diagnostics and the import carries on.
#[instrument(level = "debug", skip(matrix, config, ids), fields(rows = matrix.len()))]
pub fn parse_matrix(
    matrix: &[Vec<String>],
    config: &ImportConfig,
    ids: &mut dyn IdGenerator,
) -> Result<ImportReport, ImportError> {
    let header = locate_header(matrix, config.header_scan_rows)?;
    let header_row = matrix
        .get(header.header_row_index)
        .ok_or(ImportError::NoHeaderFound)?;
    let columns = map_day_columns(header_row);
    if columns.is_empty() {
        warn!(row = header.header_row_index, "header row names no days; nothing to import");
        return Ok(ImportReport::empty(header, columns));
    }

    let extractor = FieldExtractor::new(config);
    let defaults = config.validation_defaults();
    let mut courses = Vec::new();
    let mut diagnostics = Vec::new();

    for (row_index, row) in matrix.iter().enumerate().skip(header.header_row_index + 1) {
        let row_period = resolve_row_period(row, row_index, &header);
        debug!(row = row_index, period = ?row_period, "processing row");

        for (day, column) in columns.iter() {
            let Some(cell) = row.get(column).filter(|c| !c.trim().is_empty()) else {
                continue;
            };
            let skip = |reason: SkipReason| Diagnostic {
                row: row_index,
                column,
                day,
                reason,
            };

            for block in segment_cell(cell) {
                let entries = match extractor.extract(&block) {
                    Ok(entries) => entries,
                    Err(rejection) => {
                        debug!(row = row_index, %day, %rejection, "block is not a course");
                        diagnostics.push(skip(SkipReason::InvalidName {
                            text: block,
                            rejection,
                        }));
                        continue;
                    }
                };

                for entry in entries {
                    let Some(period) = entry.period.or_else(|| row_period.map(|p| p.label()))
                    else {
                        warn!(row = row_index, %day, course = %entry.course, "no period for course");
                        diagnostics.push(skip(SkipReason::UnresolvedPeriod {
                            course: entry.course,
                        }));
                        continue;
                    };

                    let candidate = Course {
                        id: String::new(),
                        day: day.as_str().to_string(),
                        period,
                        course: entry.course,
                        teacher: entry.teacher,
                        location: entry.location,
                        weeks: entry.weeks,
                    };
                    let validation = validate_course(&candidate, config.strict, &defaults);
                    if !validation.is_valid() {
                        warn!(
                            row = row_index,
                            %day,
                            course = %candidate.course,
                            errors = ?validation.errors,
                            "skipping invalid course"
                        );
                        diagnostics.push(skip(SkipReason::Validation {
                            course: candidate.course,
                            errors: validation.errors,
                        }));
                        continue;
                    }

                    let mut course = validation.course;
                    course.id = ids.next_id();
                    trace!(id = %course.id, course = %course.course, period = %course.period, "kept course");
                    courses.push(course);
                }
            }
        }
    }

    let conflicts = detect_conflicts(&courses);
    info!(
        courses = courses.len(),
        skipped = diagnostics.len(),
        conflicts = conflicts.len(),
        header_row = header.header_row_index,
        "import finished"
    );
    Ok(ImportReport {
        header,
        columns,
        courses,
        diagnostics,
        conflicts,
    })
}

/// Decode a file's bytes and import its first sheet.
pub fn import_bytes(
    reader: &dyn SpreadsheetReader,
    bytes: &[u8],
    config: &ImportConfig,
    ids: &mut dyn IdGenerator,
) -> Result<ImportReport, ImportError> {
    let workbook = reader.decode(bytes)?;
    let (sheet, matrix) = workbook.first_sheet().ok_or(ImportError::NoSheetFound)?;
    debug!(sheet, sheets = workbook.sheet_names().len(), "importing first sheet");
    parse_matrix(matrix, config, ids)
}

/// Read a file from disk and import it with the reader its extension picks.
#[instrument(level = "info", skip(path, config, ids), fields(path = %path.display()))]
pub fn import_path(
    path: &Path,
    config: &ImportConfig,
    ids: &mut dyn IdGenerator,
) -> anyhow::Result<ImportReport> {
    let bytes = fs::read(path).with_context(|| format!("reading {:?}", path))?;
    let reader = reader_for_path(path);
    let report = import_bytes(reader.as_ref(), &bytes, config, ids)
        .with_context(|| format!("importing {:?}", path))?;
    Ok(report)
}
