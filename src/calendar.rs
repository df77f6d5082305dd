// src/calendar.rs

//! Mapping teaching weeks and periods onto real dates and clock times.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::course::Course;
use crate::slots::{Day, Period};

/// Longest term the week counter will report.
pub const MAX_TERM_WEEKS: u32 = 30;

const TIME_UNSET: &str = "时间未设置";

/// Teaching week containing `today`, counting the week that starts on
/// `first_week_start` as week 1. Dates before the term are week 1.
pub fn current_week(first_week_start: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - first_week_start).num_days();
    let week = days.div_euclid(7) + 1;
    week.clamp(1, i64::from(MAX_TERM_WEEKS)) as u32
}

/// Calendar date of `day` in teaching week `week`.
pub fn actual_date(first_week_start: NaiveDate, week: u32, day: Day) -> Option<NaiveDate> {
    let week_offset = u64::from(week.checked_sub(1)?) * 7;
    let day_offset = u64::from(day.number() - 1);
    first_week_start.checked_add_days(Days::new(week_offset + day_offset))
}

/// Clock times of one period, as configured by the user (`"08:00"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTime {
    pub start: String,
    pub end: String,
}

impl PeriodTime {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

fn configured_time<'a>(period: &str, times: &'a [PeriodTime]) -> Option<&'a PeriodTime> {
    let period = Period::from_canonical(period)?;
    times
        .get(usize::from(period.number()) - 1)
        .filter(|t| !t.start.is_empty() && !t.end.is_empty())
}

/// `"08:00-08:45"` for a configured period, otherwise the period label as given.
pub fn period_time_text(period: &str, times: &[PeriodTime]) -> String {
    configured_time(period, times)
        .map(|t| format!("{}-{}", t.start, t.end))
        .unwrap_or_else(|| period.to_string())
}

/// Clock time of a course, plus the date of its first meeting when the term
/// start is known: `"08:00-08:45 (2024-09-02起)"`.
pub fn describe_course_time(
    course: &Course,
    first_week_start: Option<NaiveDate>,
    times: &[PeriodTime],
) -> String {
    let Some(time) = configured_time(&course.period, times) else {
        return TIME_UNSET.to_string();
    };
    let mut text = format!("{}-{}", time.start, time.end);

    let first_date = first_week_start.zip(Day::from_canonical(&course.day)).and_then(
        |(start, day)| {
            let first_week = course.week_set().min()?;
            actual_date(start, first_week, day)
        },
    );
    if let Some(date) = first_date {
        text.push_str(&format!(" ({}起)", date.format("%Y-%m-%d")));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn times() -> Vec<PeriodTime> {
        vec![
            PeriodTime::new("08:00", "08:45"),
            PeriodTime::new("08:55", "09:40"),
            PeriodTime::new("", ""),
        ]
    }

    #[test]
    fn week_counter_clamps_to_the_term() {
        let start = date(2024, 9, 2);
        assert_eq!(current_week(start, date(2024, 9, 2)), 1);
        assert_eq!(current_week(start, date(2024, 9, 8)), 1);
        assert_eq!(current_week(start, date(2024, 9, 9)), 2);
        assert_eq!(current_week(start, date(2024, 8, 20)), 1);
        assert_eq!(current_week(start, date(2025, 9, 1)), MAX_TERM_WEEKS);
    }

    #[test]
    fn dates_of_weeks_and_days() {
        let start = date(2024, 9, 2);
        assert_eq!(actual_date(start, 1, Day::Monday), Some(date(2024, 9, 2)));
        assert_eq!(actual_date(start, 3, Day::Sunday), Some(date(2024, 9, 22)));
        assert_eq!(actual_date(start, 0, Day::Monday), None);
    }

    #[test]
    fn period_text_falls_back_to_label() {
        assert_eq!(period_time_text("第2节", &times()), "08:55-09:40");
        assert_eq!(period_time_text("第3节", &times()), "第3节");
        assert_eq!(period_time_text("第9节", &times()), "第9节");
        assert_eq!(period_time_text("午休", &times()), "午休");
    }

    #[test]
    fn course_time_description() {
        let course = Course {
            day: "星期三".into(),
            period: "第1节".into(),
            weeks: "3-16".into(),
            ..Course::default()
        };
        assert_eq!(
            describe_course_time(&course, Some(date(2024, 9, 2)), &times()),
            "08:00-08:45 (2024-09-18起)"
        );
        assert_eq!(describe_course_time(&course, None, &times()), "08:00-08:45");
        assert_eq!(describe_course_time(&course, None, &[]), "时间未设置");
    }
}
