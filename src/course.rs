// src/course.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::slots::{Day, Period};
use crate::weeks::{self, WeekSet};

/// One course occurrence: a single day × period slot over a range of weeks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub day: String,
    pub period: String,
    pub course: String,
    pub teacher: String,
    pub location: String,
    pub weeks: String,
}

impl Course {
    /// Typed slot, when both day and period are canonical.
    pub fn slot(&self) -> Option<(Day, Period)> {
        Some((
            Day::from_canonical(&self.day)?,
            Period::from_canonical(&self.period)?,
        ))
    }

    pub fn week_set(&self) -> WeekSet {
        weeks::parse(&self.weeks)
    }

    pub fn slot_key(&self) -> String {
        slot_key(&self.day, &self.period)
    }

    pub fn display(&self) -> CourseDisplay {
        CourseDisplay {
            title: self.course.clone(),
            subtitle: format!("{} | {}", self.teacher, self.location),
            time: format!("{} {}", self.day, self.period),
            weeks: format!("第{}周", self.weeks),
        }
    }
}

/// `"星期一-第1节"`.
pub fn slot_key(day: &str, period: &str) -> String {
    format!("{}-{}", day, period)
}

/// Short human-facing summary of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseDisplay {
    pub title: String,
    pub subtitle: String,
    pub time: String,
    pub weeks: String,
}

/// Source of record ids, injected into assembly so tests stay deterministic.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// `course_1`, `course_2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("course")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}_{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// `course_<millis>_<seq>`, anchored at construction time. Unique within one
/// generator; separate imports should each build their own.
#[derive(Debug, Clone)]
pub struct TimestampIds {
    started_ms: i64,
    seq: u64,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self {
            started_ms: Utc::now().timestamp_millis(),
            seq: 0,
        }
    }
}

impl Default for TimestampIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&mut self) -> String {
        self.seq += 1;
        format!("course_{}_{:06}", self.started_ms, self.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Course {
        Course {
            id: "test-1".into(),
            day: "星期一".into(),
            period: "第1节".into(),
            course: "数据结构".into(),
            teacher: "张三".into(),
            location: "A301".into(),
            weeks: "1-16".into(),
        }
    }

    #[test]
    fn slot_requires_canonical_values() {
        let c = sample();
        assert_eq!(c.slot(), Some((Day::Monday, Period::new(1).unwrap())));
        let odd = Course {
            day: "周一".into(),
            ..sample()
        };
        assert_eq!(odd.slot(), None);
    }

    #[test]
    fn display_summary() {
        let d = sample().display();
        assert_eq!(d.title, "数据结构");
        assert_eq!(d.subtitle, "张三 | A301");
        assert_eq!(d.time, "星期一 第1节");
        assert_eq!(d.weeks, "第1-16周");
        assert_eq!(sample().slot_key(), "星期一-第1节");
    }

    #[test]
    fn sequential_ids_are_deterministic() {
        let mut ids = SequentialIds::default();
        assert_eq!(ids.next_id(), "course_1");
        assert_eq!(ids.next_id(), "course_2");
    }

    #[test]
    fn timestamp_ids_do_not_repeat() {
        let mut ids = TimestampIds::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert!(a.starts_with("course_"));
    }

    #[test]
    fn json_field_names_match_record_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        for key in ["id", "day", "period", "course", "teacher", "location", "weeks"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
