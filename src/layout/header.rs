// src/layout/header.rs

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::error::ImportError;
use crate::slots::{AliasScope, Day, matches_day};

pub const DEFAULT_SCAN_ROWS: usize = 15;

/// Any of these in a row marks it as carrying a period header.
const PERIOD_HEADER_KEYWORDS: &[&str] = &["节次", "时间", "节", "课时", "时段"];
/// Period column inside a definitive header row.
const DEFINITIVE_PERIOD_COLUMN: &[&str] = &["节次", "时间", "课时"];
/// Period column inside a probable header row.
const PROBABLE_PERIOD_COLUMN: &[&str] = &["节", "时间", "课时"];

/// How confidently the header row was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMatch {
    /// Period header plus at least two day labels.
    Definitive,
    /// Period header or at least three day labels.
    Probable,
    /// Nothing looked like a header; row 0 is used.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderInfo {
    pub header_row_index: usize,
    /// `None` means the period is inferred from the row offset.
    pub period_column_index: Option<usize>,
    pub matched: HeaderMatch,
}

/// Pick the header row among the first `scan_rows` rows.
///
/// Rows are tried in order and the first one satisfying either rule wins, so
/// day-like tokens further down the sheet never displace an earlier header.
#[instrument(level = "debug", skip(matrix), fields(rows = matrix.len()))]
pub fn locate_header(matrix: &[Vec<String>], scan_rows: usize) -> Result<HeaderInfo, ImportError> {
    if matrix.is_empty() {
        return Err(ImportError::NoHeaderFound);
    }

    for (idx, row) in matrix.iter().take(scan_rows).enumerate() {
        let days = day_count(row);
        let has_period_header = row_mentions_any(row, PERIOD_HEADER_KEYWORDS);
        trace!(row = idx, days, has_period_header, "scored header candidate");

        if has_period_header && days >= 2 {
            let period_column_index = find_column(row, DEFINITIVE_PERIOD_COLUMN);
            debug!(row = idx, ?period_column_index, "definitive header row");
            return Ok(HeaderInfo {
                header_row_index: idx,
                period_column_index,
                matched: HeaderMatch::Definitive,
            });
        }
        if has_period_header || days >= 3 {
            let period_column_index = find_column(row, PROBABLE_PERIOD_COLUMN);
            debug!(row = idx, ?period_column_index, "probable header row");
            return Ok(HeaderInfo {
                header_row_index: idx,
                period_column_index,
                matched: HeaderMatch::Probable,
            });
        }
    }

    debug!(scan_rows, "no header candidate, falling back to row 0");
    Ok(HeaderInfo {
        header_row_index: 0,
        period_column_index: None,
        matched: HeaderMatch::Fallback,
    })
}

/// Number of distinct days some cell in the row refers to.
pub fn day_count(row: &[String]) -> usize {
    Day::ALL
        .into_iter()
        .filter(|day| {
            row.iter()
                .any(|cell| matches_day(cell, *day, AliasScope::LabelsAndExact))
        })
        .count()
}

fn row_mentions_any(row: &[String], keywords: &[&str]) -> bool {
    row.iter()
        .any(|cell| keywords.iter().any(|k| cell.contains(k)))
}

fn find_column(row: &[String], keywords: &[&str]) -> Option<usize> {
    row.iter()
        .position(|cell| keywords.iter().any(|k| cell.contains(k)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn week_header() -> Vec<String> {
        row(&[
            "节次", "星期一", "星期二", "星期三", "星期四", "星期五", "星期六", "星期日",
        ])
    }

    #[test]
    fn standard_header_is_definitive() {
        let matrix = vec![
            week_header(),
            row(&["第1节", "周一 周二 周三", "", "", "", "", "", ""]),
        ];
        let info = locate_header(&matrix, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(info.header_row_index, 0);
        assert_eq!(info.period_column_index, Some(0));
        assert_eq!(info.matched, HeaderMatch::Definitive);
    }

    #[test]
    fn title_rows_above_the_header_are_skipped() {
        let matrix = vec![
            row(&["2024-2025学年 课程表", "", ""]),
            row(&["班级：计科2201", "", ""]),
            row(&["", "", ""]),
            week_header(),
        ];
        let info = locate_header(&matrix, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(info.header_row_index, 3);
        assert_eq!(info.period_column_index, Some(0));
    }

    #[test]
    fn days_without_period_header_are_probable() {
        let matrix = vec![
            row(&["", "Monday", "Tuesday", "Wednesday"]),
            row(&["1", "x", "y", "z"]),
        ];
        let info = locate_header(&matrix, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(info.header_row_index, 0);
        assert_eq!(info.period_column_index, None);
        assert_eq!(info.matched, HeaderMatch::Probable);
    }

    #[test]
    fn probable_header_uses_looser_period_column_keywords() {
        let matrix = vec![row(&["备注", "上课节", "星期一"])];
        let info = locate_header(&matrix, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(info.matched, HeaderMatch::Probable);
        assert_eq!(info.period_column_index, Some(1));
    }

    #[test]
    fn numeric_day_labels_count_towards_the_header() {
        let matrix = vec![row(&["课时", "1", "2", "3"])];
        assert_eq!(day_count(&matrix[0]), 3);
        let info = locate_header(&matrix, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(info.matched, HeaderMatch::Definitive);
        assert_eq!(info.period_column_index, Some(0));
    }

    #[test]
    fn nothing_recognisable_falls_back_to_row_zero() {
        let matrix = vec![row(&["a", "b"]), row(&["c", "d"])];
        let info = locate_header(&matrix, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(info.header_row_index, 0);
        assert_eq!(info.period_column_index, None);
        assert_eq!(info.matched, HeaderMatch::Fallback);
    }

    #[test]
    fn header_outside_scan_window_is_not_found() {
        let mut matrix: Vec<Vec<String>> = (0..3).map(|_| row(&["x"])).collect();
        matrix.push(week_header());
        let info = locate_header(&matrix, 3).unwrap();
        assert_eq!(info.matched, HeaderMatch::Fallback);
    }

    #[test]
    fn empty_matrix_is_terminal() {
        let err = locate_header(&[], DEFAULT_SCAN_ROWS).unwrap_err();
        assert!(matches!(err, ImportError::NoHeaderFound));
    }
}
