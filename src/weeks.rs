// src/weeks.rs

//! Week-range notation: `"1-16"`, `"1,3,5"`, `"1-8,10-16"`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Weeks above this are treated as noise so a typo like `1-99999999` cannot
/// expand into an enormous set.
pub const MAX_WEEK: u32 = 1_000;

static WEEKS_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(-\d+)?(,\d+(-\d+)?)*$").expect("week format regex"));

static WEEK_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第(\d+)周").expect("week label regex"));

/// Ordered, de-duplicated set of academic weeks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekSet(BTreeSet<u32>);

impl WeekSet {
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, week: u32) -> bool {
        self.0.contains(&week)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn min(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn max(&self) -> Option<u32> {
        self.0.last().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    pub fn intersection(&self, other: &WeekSet) -> WeekSet {
        WeekSet(self.0.intersection(&other.0).copied().collect())
    }

    pub fn is_disjoint(&self, other: &WeekSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    pub fn is_contiguous(&self) -> bool {
        match (self.min(), self.max()) {
            (Some(lo), Some(hi)) => usize::try_from(hi - lo + 1)
                .map_or(false, |span| span == self.len()),
            _ => true,
        }
    }

    /// Maximal runs of consecutive weeks as `(start, end)` pairs.
    pub fn runs(&self) -> Vec<(u32, u32)> {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        for week in self.iter() {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == week => *end = week,
                _ => runs.push((week, week)),
            }
        }
        runs
    }
}

impl FromIterator<u32> for WeekSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        WeekSet(
            iter.into_iter()
                .filter(|w| (1..=MAX_WEEK).contains(w))
                .collect(),
        )
    }
}

impl Extend<u32> for WeekSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().filter(|w| (1..=MAX_WEEK).contains(w)));
    }
}

/// How a week set is written back out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekCompaction {
    /// Always `min-max`, even when the set has gaps. `{1,2,3,9,10}` becomes
    /// `"1-10"`, which includes weeks that are not actually scheduled.
    #[default]
    Lossy,
    /// One entry per run: `{1,2,3,9,10}` becomes `"1-3,9-10"`.
    Lossless,
}

impl fmt::Display for WeekCompaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekCompaction::Lossy => f.write_str("lossy"),
            WeekCompaction::Lossless => f.write_str("lossless"),
        }
    }
}

/// Expand a week string into its set of weeks.
///
/// Each comma-separated part is either `a-b` (inclusive, ignored unless
/// `a <= b`) or a single number. Anything unparsable contributes nothing;
/// this never fails.
pub fn parse(weeks: &str) -> WeekSet {
    let mut set = WeekSet::default();
    for part in weeks.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>())
                else {
                    continue;
                };
                if start <= end {
                    set.extend(start..=end.min(MAX_WEEK));
                }
            }
            None => {
                if let Ok(week) = part.parse::<u32>() {
                    set.extend(Some(week));
                }
            }
        }
    }
    set
}

/// Collapse a week set with the default (lossy) compaction.
pub fn normalize(set: &WeekSet) -> Option<String> {
    normalize_with(set, WeekCompaction::Lossy)
}

/// Collapse a week set back into canonical notation. `None` for an empty set.
pub fn normalize_with(set: &WeekSet, compaction: WeekCompaction) -> Option<String> {
    let (lo, hi) = (set.min()?, set.max()?);
    if compaction == WeekCompaction::Lossy || set.is_contiguous() {
        return Some(format!("{}-{}", lo, hi));
    }
    let parts: Vec<String> = set
        .runs()
        .into_iter()
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect();
    Some(parts.join(","))
}

/// True when two week strings share at least one week.
pub fn overlaps(a: &str, b: &str) -> bool {
    !parse(a).is_disjoint(&parse(b))
}

/// Grammar check for a stored week string.
pub fn is_valid_format(weeks: &str) -> bool {
    let weeks = weeks.trim();
    !weeks.is_empty() && WEEKS_FORMAT.is_match(weeks)
}

/// `"第3周"` → 3.
pub fn parse_week_label(label: &str) -> Option<u32> {
    WEEK_LABEL
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|w| *w > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_range_is_stable() {
        assert_eq!(normalize(&parse("1-16")).as_deref(), Some("1-16"));
        assert_eq!(normalize(&parse("3,4,5")).as_deref(), Some("3-5"));
    }

    #[test]
    fn parse_unions_ranges_and_singles() {
        assert_eq!(parse("1-3,5-7").to_vec(), vec![1, 2, 3, 5, 6, 7]);
        assert_eq!(parse("1,3,5").to_vec(), vec![1, 3, 5]);
        assert_eq!(parse("5-7, 6-8").to_vec(), vec![5, 6, 7, 8]);
    }

    #[test]
    fn parse_skips_garbage_silently() {
        assert!(parse("").is_empty());
        assert!(parse("abc").is_empty());
        assert!(parse("9-3").is_empty());
        assert_eq!(parse("x,2,1-y,4").to_vec(), vec![2, 4]);
        assert!(parse("0").is_empty());
    }

    #[test]
    fn overlap_detection() {
        assert!(overlaps("1-8", "5-12"));
        assert!(!overlaps("1-8", "10-16"));
        assert!(overlaps("1,3,5", "5-6"));
        assert!(!overlaps("", "1-16"));
    }

    #[test]
    fn gaps_collapse_to_min_max_by_default() {
        let set = parse("1-3,9-10");
        assert_eq!(normalize(&set).as_deref(), Some("1-10"));
        assert_eq!(
            normalize_with(&set, WeekCompaction::Lossless).as_deref(),
            Some("1-3,9-10")
        );
        assert_eq!(
            normalize_with(&parse("2,4-5"), WeekCompaction::Lossless).as_deref(),
            Some("2,4-5")
        );
    }

    #[test]
    fn empty_set_has_no_notation() {
        assert_eq!(normalize(&WeekSet::default()), None);
    }

    #[test]
    fn format_grammar() {
        assert!(is_valid_format("1-16"));
        assert!(is_valid_format("1,3,5"));
        assert!(is_valid_format("1-8,10-16"));
        assert!(is_valid_format(" 1-16 "));
        assert!(!is_valid_format("invalid"));
        assert!(!is_valid_format(""));
        assert!(!is_valid_format("1-"));
        assert!(!is_valid_format("1,,2"));
    }

    #[test]
    fn runs_split_on_gaps() {
        assert_eq!(parse("1-3,5,7-8").runs(), vec![(1, 3), (5, 5), (7, 8)]);
        assert!(parse("4-9").is_contiguous());
        assert!(!parse("4,6").is_contiguous());
    }

    #[test]
    fn oversized_ranges_are_capped() {
        let set = parse("999-5000");
        assert_eq!(set.to_vec(), vec![999, 1000]);
    }

    #[test]
    fn week_labels() {
        assert_eq!(parse_week_label("第3周"), Some(3));
        assert_eq!(parse_week_label("第0周"), None);
        assert_eq!(parse_week_label("三"), None);
    }
}
