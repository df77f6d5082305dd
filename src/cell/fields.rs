// src/cell/fields.rs

//! Per-block field extraction: course name, teacher, location, weeks and
//! period sub-range, each found by its own rule chain.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use super::rules::{first_match, group1, group2, Rule};
use crate::config::ImportConfig;
use crate::error::NameRejection;
use crate::slots::{period_label, PERIOD_COUNT};
use crate::weeks::{self, WeekCompaction};

/// Room code: optional leading letter, 3–4 digits, optional trailing letter.
const ROOM: &str = r"[A-Z]?[0-9]{3,4}[A-Z]?";

const TIME_KEYWORDS: &[&str] = &["节次", "时间", "课时", "时段", "星期", "周"];

static NAME_WITH_CATEGORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\[]+)\[(?:考查|必修|选修|实践|理论|考试)\]").expect("course name regex")
});

/// Applied in order to one line of an untagged block to cut it down to the name.
static NAME_STRIPS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\[[^\]]*\]",
        r"\([^)]*\)",
        r"（[^）]*）",
        r"[：:].*",
        r"\s+(?:教师|老师|地点|教室|周次)\s*$",
        r"\s+\w+-[A-Za-z_]*[0-9][0-9A-Za-z_]*.*$",
        r"\s+[\x{4e00}-\x{9fa5}]+实验室.*$",
        r"\s+[\x{4e00}-\x{9fa5}]+教室.*$",
        r"\s+组班.*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("name strip regex"))
    .collect()
});

static TEACHER_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::pattern(
            "name-code-role",
            r"([\x{4e00}-\x{9fa5}]{2,4})-[0-9A-Za-z_]+\[(?:主讲|辅讲)\]",
            group1,
        ),
        Rule::pattern("name-code", r"([\x{4e00}-\x{9fa5}]{2,4})-[0-9A-Za-z_]+", group1),
        Rule::pattern(
            "name-role",
            r"([\x{4e00}-\x{9fa5}]{2,4})\[(?:主讲|辅讲|教师)\]",
            group1,
        ),
        Rule::pattern("labelled", r"教师[：:]\s*([\x{4e00}-\x{9fa5}]{2,4})", group1),
        Rule::pattern("honorific", r"([\x{4e00}-\x{9fa5}]{2,4})(?:老师|教师)", group1),
    ]
});

static LOCATION_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::pattern(
            "room-after-hall",
            &format!(r"(\w+实验室|\w+教室)\s+({})", ROOM),
            group2,
        ),
        Rule::pattern("room-with-note", &format!(r"({})[(（][^)）]+[)）]", ROOM), group1),
        Rule::pattern("labelled-place", &format!(r"地点[：:]\s*({})", ROOM), group1),
        Rule::pattern("labelled-room", &format!(r"教室[：:]\s*({})", ROOM), group1),
        Rule::scan("bare-room", find_bare_room_code),
        Rule::pattern("named-hall", r"(\w+实验室|\w+教室|\w+机房)", group1),
    ]
});

static WEEK_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::pattern("bracketed-list", r"\[([0-9,，\-]+)周\]", group1),
        Rule::pattern("bracketed-range", r"\[([0-9]+-[0-9]+)周\]", group1),
        Rule::pattern("bracketed-single", r"\[([0-9]+)周\]", group1),
        Rule::pattern("range", r"([0-9]+-[0-9]+)周", group1),
        Rule::pattern("nth-week", r"第([0-9]+)周", group1),
        Rule::pattern("labelled-list", r"周次[：:]\s*([0-9,，\-]+)", group1),
        Rule::pattern("bare-list", r"([0-9,，\-]+)周", group1),
    ]
});

static PERIOD_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([0-9]+)-([0-9]+)\]").expect("period range regex"));
static PERIOD_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([0-9]+)\]").expect("period single regex"));

/// One candidate course pulled out of a block. `period` is `None` when the
/// block itself names no period and the row has to supply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    pub course: String,
    pub teacher: String,
    pub location: String,
    pub weeks: String,
    pub period: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    default_weeks: String,
    compaction: WeekCompaction,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

impl FieldExtractor {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            default_weeks: config.default_weeks.clone(),
            compaction: config.week_compaction,
        }
    }

    /// Extract every entry of one block: one per period in its bracketed
    /// period range, or a single period-less entry.
    pub fn extract(&self, block: &str) -> Result<Vec<ExtractedEntry>, NameRejection> {
        let course = extract_course_name(block)?;
        let teacher = extract_teacher(block, &course).unwrap_or_default();
        let location = extract_location(block).unwrap_or_default();
        let weeks = extract_weeks(block, self.compaction)
            .unwrap_or_else(|| self.default_weeks.clone());
        let periods = extract_periods(block);
        debug!(
            course = %course,
            teacher = %teacher,
            location = %location,
            weeks = %weeks,
            periods = periods.len(),
            "extracted block"
        );

        let entry = ExtractedEntry {
            course,
            teacher,
            location,
            weeks,
            period: None,
        };
        if periods.is_empty() {
            return Ok(vec![entry]);
        }
        Ok(periods
            .into_iter()
            .map(|period| ExtractedEntry {
                period: Some(period),
                ..entry.clone()
            })
            .collect())
    }
}

/// Course name of a block, or the reason the block is not a course.
///
/// An untagged block is named by its first line that still reads as a name
/// once metadata is stripped; if none does, the first line's rejection is
/// reported.
pub fn extract_course_name(block: &str) -> Result<String, NameRejection> {
    if let Some(c) = NAME_WITH_CATEGORY.captures(block) {
        let name = c.get(1).map_or("", |m| m.as_str()).trim().to_string();
        check_course_name(&name)?;
        return Ok(name);
    }

    let mut first_rejection = None;
    for line in block.lines() {
        let name = strip_name_line(line);
        match check_course_name(&name) {
            Ok(()) => return Ok(name),
            Err(rejection) => {
                trace!(line, %rejection, "line does not name the course");
                first_rejection.get_or_insert(rejection);
            }
        }
    }
    Err(first_rejection.unwrap_or(NameRejection::Empty))
}

fn strip_name_line(line: &str) -> String {
    let mut name = line.to_string();
    for strip in NAME_STRIPS.iter() {
        name = strip.replace_all(&name, "").into_owned();
    }
    name.trim().to_string()
}

pub fn check_course_name(name: &str) -> Result<(), NameRejection> {
    if name.is_empty() {
        return Err(NameRejection::Empty);
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        return Err(NameRejection::Numeric);
    }
    if name.chars().count() < 2 {
        return Err(NameRejection::TooShort);
    }
    if name
        .chars()
        .all(|c| c.is_whitespace() || c.is_ascii_punctuation())
    {
        return Err(NameRejection::PunctuationOnly);
    }
    if TIME_KEYWORDS.iter().any(|k| name.contains(k)) {
        return Err(NameRejection::TimeKeyword);
    }
    Ok(())
}

/// Teacher name; a capture equal to the course name itself is skipped.
pub fn extract_teacher(block: &str, course_name: &str) -> Option<String> {
    let compact: String = course_name.chars().filter(|c| !c.is_whitespace()).collect();
    first_match(&TEACHER_RULES, block, |candidate| candidate != compact).map(|(_, t)| t)
}

pub fn extract_location(block: &str) -> Option<String> {
    first_match(&LOCATION_RULES, block, |_| true).map(|(_, l)| l)
}

/// Canonical week string, or `None` when the block names no usable weeks.
pub fn extract_weeks(block: &str, compaction: WeekCompaction) -> Option<String> {
    let (rule, raw) = first_match(&WEEK_RULES, block, |_| true)?;
    let raw = raw.replace('，', ",");
    let weeks = if raw.contains(',') || raw.contains('-') {
        weeks::normalize_with(&weeks::parse(&raw), compaction)
    } else {
        raw.parse::<u32>()
            .ok()
            .filter(|w| *w > 0)
            .map(|w| format!("{}-{}", w, w))
    };
    trace!(rule, raw = %raw, ?weeks, "week expression");
    weeks
}

/// Period labels named by the block: `[3-4]` gives `第3节`, `第4节`; `[2]`
/// gives `第2节`. A range yields at most twelve labels.
pub fn extract_periods(block: &str) -> Vec<String> {
    if let Some(c) = PERIOD_RANGE.captures(block) {
        let (Some(start), Some(end)) = (capture_number(&c, 1), capture_number(&c, 2)) else {
            return Vec::new();
        };
        return (start..=end)
            .take(usize::from(PERIOD_COUNT))
            .map(period_label)
            .collect();
    }
    PERIOD_SINGLE
        .captures(block)
        .and_then(|c| capture_number(&c, 1))
        .map(period_label)
        .into_iter()
        .collect()
}

fn capture_number(c: &Captures<'_>, group: usize) -> Option<u32> {
    c.get(group).and_then(|m| m.as_str().parse::<u32>().ok())
}

/// First standalone room code. The code must not run into further digits and
/// must not be the tail of an ASCII identifier such as a teacher code
/// (`t001`).
pub fn find_bare_room_code(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    (0..chars.len()).find_map(|start| room_code_at(&chars, start))
}

fn room_code_at(chars: &[char], start: usize) -> Option<String> {
    let joins_identifier = |c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '-';
    if start > 0 && chars.get(start - 1).is_some_and(joins_identifier) {
        return None;
    }

    let first = *chars.get(start)?;
    let digits_from = if first.is_ascii_uppercase() { start + 1 } else { start };
    let digit_run = chars
        .iter()
        .skip(digits_from)
        .take_while(|c| c.is_ascii_digit())
        .count();
    if !(3..=4).contains(&digit_run) {
        return None;
    }

    let mut end = digits_from + digit_run;
    if chars.get(end).is_some_and(char::is_ascii_uppercase) {
        end += 1;
    }
    if chars.get(end).is_some_and(char::is_ascii_digit) {
        return None;
    }
    Some(chars.get(start..end)?.iter().collect())
}
