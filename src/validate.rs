// src/validate.rs

//! Record validation and time-conflict detection.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::course::Course;
use crate::slots::{Day, Period};
use crate::weeks;

pub const UNKNOWN_TEACHER: &str = "未知教师";
pub const UNKNOWN_LOCATION: &str = "未知地点";
pub const DEFAULT_WEEKS: &str = "1-16";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("course name must not be empty")]
    MissingCourseName,
    #[error("day must be one of 星期一..星期日")]
    InvalidDay,
    #[error("period must be one of 第1节..第12节")]
    InvalidPeriod,
    #[error("teacher must not be empty")]
    MissingTeacher,
    #[error("location must not be empty")]
    MissingLocation,
    #[error("weeks must look like \"1-16\" or \"1-8,10-16\"")]
    InvalidWeeks,
}

/// Values written into missing fields by non-strict validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDefaults {
    pub teacher: String,
    pub location: String,
    pub weeks: String,
}

impl Default for ValidationDefaults {
    fn default() -> Self {
        Self {
            teacher: UNKNOWN_TEACHER.to_string(),
            location: UNKNOWN_LOCATION.to_string(),
            weeks: DEFAULT_WEEKS.to_string(),
        }
    }
}

/// Outcome of [`validate_course`]: the possibly-repaired record and every
/// problem found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub course: Course,
    pub errors: Vec<ValidationError>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a record.
///
/// `course`, `day` and `period` are always required. In strict mode teacher,
/// location and a well-formed `weeks` are required too; otherwise those three
/// are filled from `defaults`. The input is never modified.
pub fn validate_course(course: &Course, strict: bool, defaults: &ValidationDefaults) -> Validation {
    let mut fixed = course.clone();
    let mut errors = Vec::new();

    if course.course.trim().is_empty() {
        errors.push(ValidationError::MissingCourseName);
    }
    if Day::from_canonical(&course.day).is_none() {
        errors.push(ValidationError::InvalidDay);
    }
    if Period::from_canonical(&course.period).is_none() {
        errors.push(ValidationError::InvalidPeriod);
    }

    if course.teacher.trim().is_empty() {
        if strict {
            errors.push(ValidationError::MissingTeacher);
        } else {
            fixed.teacher = defaults.teacher.clone();
        }
    }
    if course.location.trim().is_empty() {
        if strict {
            errors.push(ValidationError::MissingLocation);
        } else {
            fixed.location = defaults.location.clone();
        }
    }
    if !weeks::is_valid_format(&course.weeks) {
        if strict {
            errors.push(ValidationError::InvalidWeeks);
        } else {
            debug!(weeks = %course.weeks, "replacing malformed weeks with default");
            fixed.weeks = defaults.weeks.clone();
        }
    }

    Validation {
        course: fixed,
        errors,
    }
}

/// Grammar gate for week strings.
pub fn validate_weeks_format(weeks: &str) -> bool {
    weeks::is_valid_format(weeks)
}

/// Existing records that clash with a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeConflict<'a> {
    pub conflicts: Vec<&'a Course>,
}

impl TimeConflict<'_> {
    pub fn has_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.conflicts.iter().map(|c| c.id.clone()).collect()
    }
}

/// Every record in `existing` (except `exclude_id`) on the same day and
/// period as `candidate` whose weeks overlap it.
pub fn validate_time_conflict<'a>(
    candidate: &Course,
    existing: &'a [Course],
    exclude_id: Option<&str>,
) -> TimeConflict<'a> {
    let conflicts = existing
        .iter()
        .filter(|c| exclude_id.map_or(true, |id| c.id != id))
        .filter(|c| c.day == candidate.day && c.period == candidate.period)
        .filter(|c| weeks::overlaps(&c.weeks, &candidate.weeks))
        .collect();
    TimeConflict { conflicts }
}

/// Two records that occupy the same slot in at least one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictPair {
    pub first: String,
    pub second: String,
    pub day: String,
    pub period: String,
    pub shared_weeks: Vec<u32>,
}

/// All pairwise conflicts inside one record set, in input order.
pub fn detect_conflicts(courses: &[Course]) -> Vec<ConflictPair> {
    let mut by_slot: BTreeMap<(&str, &str), Vec<&Course>> = BTreeMap::new();
    for course in courses {
        by_slot
            .entry((course.day.as_str(), course.period.as_str()))
            .or_default()
            .push(course);
    }

    let mut pairs = Vec::new();
    for ((day, period), group) in by_slot {
        for (i, first) in group.iter().enumerate() {
            let first_weeks = first.week_set();
            for second in group.iter().skip(i + 1) {
                let shared = first_weeks.intersection(&second.week_set());
                if shared.is_empty() {
                    continue;
                }
                pairs.push(ConflictPair {
                    first: first.id.clone(),
                    second: second.id.clone(),
                    day: day.to_string(),
                    period: period.to_string(),
                    shared_weeks: shared.to_vec(),
                });
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: &str, day: &str, period: &str, weeks: &str) -> Course {
        Course {
            id: id.into(),
            day: day.into(),
            period: period.into(),
            course: "数据结构".into(),
            teacher: "张三".into(),
            location: "A301".into(),
            weeks: weeks.into(),
        }
    }

    fn empty_record() -> Course {
        Course {
            id: "test-2".into(),
            weeks: "invalid".into(),
            ..Course::default()
        }
    }

    #[test]
    fn valid_course_passes_both_modes() {
        let c = course("test-1", "星期一", "第1节", "1-16");
        let defaults = ValidationDefaults::default();
        assert!(validate_course(&c, true, &defaults).is_valid());
        let lenient = validate_course(&c, false, &defaults);
        assert!(lenient.is_valid());
        assert_eq!(lenient.course, c);
    }

    #[test]
    fn strict_mode_reports_every_problem() {
        let v = validate_course(&empty_record(), true, &ValidationDefaults::default());
        assert!(!v.is_valid());
        assert_eq!(
            v.errors,
            vec![
                ValidationError::MissingCourseName,
                ValidationError::InvalidDay,
                ValidationError::InvalidPeriod,
                ValidationError::MissingTeacher,
                ValidationError::MissingLocation,
                ValidationError::InvalidWeeks,
            ]
        );
    }

    #[test]
    fn lenient_mode_fills_defaults_but_keeps_slot_errors() {
        let input = empty_record();
        let v = validate_course(&input, false, &ValidationDefaults::default());
        assert!(!v.is_valid());
        assert_eq!(
            v.errors,
            vec![
                ValidationError::MissingCourseName,
                ValidationError::InvalidDay,
                ValidationError::InvalidPeriod,
            ]
        );
        assert_eq!(v.course.teacher, UNKNOWN_TEACHER);
        assert_eq!(v.course.location, UNKNOWN_LOCATION);
        assert_eq!(v.course.weeks, DEFAULT_WEEKS);
        // the input record is left untouched
        assert_eq!(input.teacher, "");
        assert_eq!(input.weeks, "invalid");
    }

    #[test]
    fn non_canonical_slots_are_rejected() {
        let c = course("x", "周一", "第13节", "1-16");
        let v = validate_course(&c, false, &ValidationDefaults::default());
        assert_eq!(
            v.errors,
            vec![ValidationError::InvalidDay, ValidationError::InvalidPeriod]
        );
    }

    #[test]
    fn conflict_needs_same_slot_and_overlapping_weeks() {
        let existing = vec![
            course("a", "星期一", "第1节", "1-8"),
            course("b", "星期一", "第1节", "10-16"),
            course("c", "星期二", "第1节", "1-16"),
            course("d", "星期一", "第2节", "1-16"),
        ];
        let candidate = course("new", "星期一", "第1节", "5-12");
        let result = validate_time_conflict(&candidate, &existing, None);
        assert!(result.has_conflict());
        assert_eq!(result.ids(), vec!["a".to_string(), "b".to_string()]);

        let result = validate_time_conflict(&candidate, &existing, Some("a"));
        assert_eq!(result.ids(), vec!["b".to_string()]);

        let late = course("late", "星期一", "第1节", "17-18");
        assert!(!validate_time_conflict(&late, &existing, None).has_conflict());
    }

    #[test]
    fn detect_conflicts_lists_shared_weeks() {
        let set = vec![
            course("a", "星期一", "第1节", "1-8"),
            course("b", "星期一", "第1节", "7-10"),
            course("c", "星期一", "第1节", "9-16"),
            course("d", "星期三", "第1节", "1-16"),
        ];
        let pairs = detect_conflicts(&set);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].first, "a");
        assert_eq!(pairs[0].second, "b");
        assert_eq!(pairs[0].shared_weeks, vec![7, 8]);
        assert_eq!(pairs[1].first, "b");
        assert_eq!(pairs[1].second, "c");
        assert_eq!(pairs[1].shared_weeks, vec![9, 10]);
    }

    #[test]
    fn weeks_format_gate() {
        assert!(validate_weeks_format("1-8,10-16"));
        assert!(!validate_weeks_format("第1周"));
    }
}
