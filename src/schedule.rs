// src/schedule.rs

//! An editable set of courses: add, update and remove with validation and
//! clash checks, week filtering, slot grouping and JSON persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::course::{Course, IdGenerator, TimestampIds};
use crate::slots::{Day, Period};
use crate::validate::{validate_course, validate_time_conflict, ValidationDefaults, ValidationError};
use crate::weeks::{self, WeekSet};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid course: {0:?}")]
    Invalid(Vec<ValidationError>),
    #[error("time conflict with {}", .0.join(", "))]
    Conflict(Vec<String>),
    #[error("no course with id `{0}`")]
    NotFound(String),
    #[error("a course with id `{0}` already exists")]
    DuplicateId(String),
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoursePatch {
    pub day: Option<String>,
    pub period: Option<String>,
    pub course: Option<String>,
    pub teacher: Option<String>,
    pub location: Option<String>,
    pub weeks: Option<String>,
}

impl CoursePatch {
    pub fn apply(&self, target: &mut Course) {
        let fields = [
            (&self.day, &mut target.day),
            (&self.period, &mut target.period),
            (&self.course, &mut target.course),
            (&self.teacher, &mut target.teacher),
            (&self.location, &mut target.location),
            (&self.weeks, &mut target.weeks),
        ];
        for (patch, field) in fields {
            if let Some(value) = patch {
                *field = value.clone();
            }
        }
    }
}

/// On-disk shape of a saved schedule.
#[derive(Debug, Serialize, Deserialize)]
struct ScheduleFile {
    courses: Vec<Course>,
    last_modified: DateTime<Utc>,
}

pub struct Schedule {
    courses: Vec<Course>,
    defaults: ValidationDefaults,
    ids: Box<dyn IdGenerator + Send>,
    last_modified: DateTime<Utc>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(ValidationDefaults::default())
    }
}

impl Schedule {
    pub fn new(defaults: ValidationDefaults) -> Self {
        Self::with_ids(defaults, Box::new(TimestampIds::new()))
    }

    pub fn with_ids(defaults: ValidationDefaults, ids: Box<dyn IdGenerator + Send>) -> Self {
        Self {
            courses: Vec::new(),
            defaults,
            ids,
            last_modified: Utc::now(),
        }
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn get(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Validate, clash-check and store a course. A blank id is filled in.
    pub fn add(&mut self, course: Course) -> Result<&Course, ScheduleError> {
        let validation = validate_course(&course, false, &self.defaults);
        if !validation.is_valid() {
            return Err(ScheduleError::Invalid(validation.errors));
        }
        let mut course = validation.course;
        if course.id.trim().is_empty() {
            course.id = self.ids.next_id();
        } else if self.get(&course.id).is_some() {
            return Err(ScheduleError::DuplicateId(course.id));
        }

        let conflict = validate_time_conflict(&course, &self.courses, None);
        if conflict.has_conflict() {
            warn!(course = %course.course, slot = %course.slot_key(), "refusing clashing course");
            return Err(ScheduleError::Conflict(conflict.ids()));
        }

        debug!(id = %course.id, slot = %course.slot_key(), "added course");
        self.courses.push(course);
        self.touch();
        let idx = self.courses.len() - 1;
        Ok(&self.courses[idx])
    }

    /// Apply a patch to the course with `id`. The stored course changes only
    /// if the patched copy validates and clashes with nothing but itself.
    pub fn update(&mut self, id: &str, patch: &CoursePatch) -> Result<&Course, ScheduleError> {
        let idx = self
            .courses
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;

        let mut updated = self.courses[idx].clone();
        patch.apply(&mut updated);
        let validation = validate_course(&updated, false, &self.defaults);
        if !validation.is_valid() {
            return Err(ScheduleError::Invalid(validation.errors));
        }
        let updated = validation.course;

        let conflict = validate_time_conflict(&updated, &self.courses, Some(id));
        if conflict.has_conflict() {
            return Err(ScheduleError::Conflict(conflict.ids()));
        }

        self.courses[idx] = updated;
        self.touch();
        Ok(&self.courses[idx])
    }

    pub fn remove(&mut self, id: &str) -> Option<Course> {
        let idx = self.courses.iter().position(|c| c.id == id)?;
        self.touch();
        Some(self.courses.remove(idx))
    }

    /// Swap in a freshly imported course list wholesale.
    pub fn replace_all(&mut self, courses: Vec<Course>) {
        info!(old = self.courses.len(), new = courses.len(), "replacing schedule");
        self.courses = courses;
        self.touch();
    }

    /// Every week any course meets, ascending.
    pub fn available_weeks(&self) -> Vec<u32> {
        let mut all = WeekSet::default();
        for course in &self.courses {
            all.extend(course.week_set().iter());
        }
        all.to_vec()
    }

    /// [`Self::available_weeks`] as `第N周` labels.
    pub fn available_week_labels(&self) -> Vec<String> {
        self.available_weeks()
            .into_iter()
            .map(|w| format!("第{}周", w))
            .collect()
    }

    /// Courses meeting in at least one of `weeks`; all courses when `weeks`
    /// is empty.
    pub fn courses_in_weeks(&self, weeks: &[u32]) -> Vec<&Course> {
        if weeks.is_empty() {
            return self.courses.iter().collect();
        }
        self.courses
            .iter()
            .filter(|c| {
                let meets = c.week_set();
                weeks.iter().any(|w| meets.contains(*w))
            })
            .collect()
    }

    /// Like [`Self::courses_in_weeks`] but with `第N周` labels. Labels that do
    /// not parse select nothing.
    pub fn courses_in_week_labels(&self, labels: &[&str]) -> Vec<&Course> {
        if labels.is_empty() {
            return self.courses.iter().collect();
        }
        let weeks: Vec<u32> = labels
            .iter()
            .filter_map(|l| weeks::parse_week_label(l))
            .collect();
        if weeks.is_empty() {
            return Vec::new();
        }
        self.courses_in_weeks(&weeks)
    }

    /// All courses grouped by slot. Records whose day or period is not
    /// canonical are left out.
    pub fn by_time_slot(&self) -> BTreeMap<(Day, Period), Vec<&Course>> {
        group_by_slot(self.courses.iter())
    }

    /// The grid for one teaching week.
    pub fn week_grid(&self, week: u32) -> BTreeMap<(Day, Period), Vec<&Course>> {
        group_by_slot(self.courses_in_weeks(&[week]).into_iter())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = ScheduleFile {
            courses: self.courses.clone(),
            last_modified: self.last_modified,
        };
        let json = serde_json::to_string_pretty(&file).context("serializing schedule")?;
        fs::write(path, json).with_context(|| format!("writing schedule {:?}", path))?;
        info!(path = %path.display(), courses = self.courses.len(), "saved schedule");
        Ok(())
    }

    /// Load a saved schedule. Records are taken as stored.
    pub fn load(path: &Path, defaults: ValidationDefaults) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading schedule {:?}", path))?;
        let file: ScheduleFile = serde_json::from_str(&text)
            .with_context(|| format!("parsing schedule {:?}", path))?;
        info!(path = %path.display(), courses = file.courses.len(), "loaded schedule");
        let mut schedule = Self::new(defaults);
        schedule.courses = file.courses;
        schedule.last_modified = file.last_modified;
        Ok(schedule)
    }

    fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

fn group_by_slot<'a>(
    courses: impl Iterator<Item = &'a Course>,
) -> BTreeMap<(Day, Period), Vec<&'a Course>> {
    let mut map: BTreeMap<(Day, Period), Vec<&Course>> = BTreeMap::new();
    for course in courses {
        match course.slot() {
            Some(slot) => map.entry(slot).or_default().push(course),
            None => debug!(id = %course.id, "course has no canonical slot"),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::SequentialIds;
    use tempfile::NamedTempFile;

    fn schedule() -> Schedule {
        Schedule::with_ids(ValidationDefaults::default(), Box::new(SequentialIds::default()))
    }

    fn course(day: &str, period: &str, name: &str, weeks: &str) -> Course {
        Course {
            day: day.into(),
            period: period.into(),
            course: name.into(),
            teacher: "张三".into(),
            location: "A301".into(),
            weeks: weeks.into(),
            ..Course::default()
        }
    }

    #[test]
    fn add_fills_ids_and_defaults() {
        let mut s = schedule();
        let added = s
            .add(Course {
                teacher: String::new(),
                ..course("星期一", "第1节", "高数", "1-8")
            })
            .unwrap();
        assert_eq!(added.id, "course_1");
        assert_eq!(added.teacher, "未知教师");
        assert_eq!(s.courses().len(), 1);
    }

    #[test]
    fn add_rejects_invalid_and_clashing_courses() {
        let mut s = schedule();
        s.add(course("星期一", "第1节", "高数", "1-8")).unwrap();

        let err = s.add(course("Monday", "第1节", "英语", "1-8")).unwrap_err();
        assert_eq!(err, ScheduleError::Invalid(vec![ValidationError::InvalidDay]));

        let err = s.add(course("星期一", "第1节", "物理", "8-16")).unwrap_err();
        assert_eq!(err, ScheduleError::Conflict(vec!["course_1".into()]));
        assert_eq!(err.to_string(), "time conflict with course_1");

        // same slot, disjoint weeks
        s.add(course("星期一", "第1节", "物理", "9-16")).unwrap();
        assert_eq!(s.courses().len(), 2);
    }

    #[test]
    fn explicit_duplicate_id_is_refused() {
        let mut s = schedule();
        let mut c = course("星期一", "第1节", "高数", "1-8");
        c.id = "x".into();
        s.add(c.clone()).unwrap();
        c.period = "第2节".into();
        assert_eq!(s.add(c).unwrap_err(), ScheduleError::DuplicateId("x".into()));
    }

    #[test]
    fn update_checks_conflicts_against_others_only() {
        let mut s = schedule();
        s.add(course("星期一", "第1节", "高数", "1-8")).unwrap();
        s.add(course("星期一", "第2节", "英语", "1-8")).unwrap();

        // moving onto its own slot is fine
        let patch = CoursePatch {
            weeks: Some("1-16".into()),
            ..CoursePatch::default()
        };
        assert_eq!(s.update("course_1", &patch).unwrap().weeks, "1-16");

        let patch = CoursePatch {
            period: Some("第1节".into()),
            ..CoursePatch::default()
        };
        assert_eq!(
            s.update("course_2", &patch).unwrap_err(),
            ScheduleError::Conflict(vec!["course_1".into()])
        );
        assert_eq!(s.get("course_2").unwrap().period, "第2节");

        assert_eq!(
            s.update("nope", &patch).unwrap_err(),
            ScheduleError::NotFound("nope".into())
        );
    }

    #[test]
    fn remove_and_replace() {
        let mut s = schedule();
        s.add(course("星期一", "第1节", "高数", "1-8")).unwrap();
        assert_eq!(s.remove("course_1").unwrap().course, "高数");
        assert!(s.remove("course_1").is_none());

        s.replace_all(vec![course("星期二", "第3节", "化学", "2-3")]);
        assert_eq!(s.courses().len(), 1);
    }

    #[test]
    fn week_queries() {
        let mut s = schedule();
        s.replace_all(vec![
            Course {
                id: "a".into(),
                ..course("星期一", "第1节", "高数", "1-3")
            },
            Course {
                id: "b".into(),
                ..course("星期三", "第2节", "英语", "5,7")
            },
            Course {
                id: "c".into(),
                ..course("周八", "第2节", "坏数据", "1-2")
            },
        ]);
        assert_eq!(s.available_weeks(), vec![1, 2, 3, 5, 7]);
        assert_eq!(s.available_week_labels()[3], "第5周");

        let ids = |courses: Vec<&Course>| courses.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(s.courses_in_weeks(&[])), vec!["a", "b", "c"]);
        assert_eq!(ids(s.courses_in_weeks(&[3, 7])), vec!["a", "b"]);
        assert_eq!(ids(s.courses_in_week_labels(&["第7周"])), vec!["b"]);
        assert!(s.courses_in_week_labels(&["下周"]).is_empty());

        let grid = s.by_time_slot();
        assert_eq!(grid.len(), 2);
        let monday_first = (Day::Monday, Period::new(1).unwrap());
        assert_eq!(grid[&monday_first][0].id, "a");
        assert!(s.week_grid(4).is_empty());
        assert_eq!(s.week_grid(5).len(), 1);
    }

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let mut s = schedule();
        s.add(course("星期五", "第4节", "体育", "1-16")).unwrap();
        let file = NamedTempFile::new()?;
        s.save(file.path())?;

        let loaded = Schedule::load(file.path(), ValidationDefaults::default())?;
        assert_eq!(loaded.courses(), s.courses());
        assert_eq!(loaded.last_modified(), s.last_modified());
        Ok(())
    }
}
