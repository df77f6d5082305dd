// src/slots.rs

//! Canonical day and period vocabulary.
//!
//! Day labels in real timetables come in many shapes (`星期一`, `周一`, `一`,
//! `Monday`, `1`). Recognition is driven by the declarative [`DAY_ALIASES`]
//! table so a new alias is a data change, not a control-flow change.

use serde::{Serialize, Serializer};
use std::fmt;

/// Number of canonical periods in a teaching day.
pub const PERIOD_COUNT: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Canonical name as stored on a course record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "星期一",
            Day::Tuesday => "星期二",
            Day::Wednesday => "星期三",
            Day::Thursday => "星期四",
            Day::Friday => "星期五",
            Day::Saturday => "星期六",
            Day::Sunday => "星期日",
        }
    }

    /// The canonical name without its `星期` prefix.
    pub fn short(&self) -> &'static str {
        match self {
            Day::Monday => "一",
            Day::Tuesday => "二",
            Day::Wednesday => "三",
            Day::Thursday => "四",
            Day::Friday => "五",
            Day::Saturday => "六",
            Day::Sunday => "日",
        }
    }

    /// ISO weekday number, Monday = 1.
    pub fn number(&self) -> u32 {
        match self {
            Day::Monday => 1,
            Day::Tuesday => 2,
            Day::Wednesday => 3,
            Day::Thursday => 4,
            Day::Friday => 5,
            Day::Saturday => 6,
            Day::Sunday => 7,
        }
    }

    /// Exact lookup of a canonical name; aliases are not accepted here.
    pub fn from_canonical(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|day| day.as_str() == s)
    }

    pub fn aliases(&self) -> &'static DayAliases {
        &DAY_ALIASES[*self as usize]
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A teaching period, `第1节` through `第12节`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(u8);

impl Period {
    pub fn new(number: u8) -> Option<Self> {
        (1..=PERIOD_COUNT).contains(&number).then_some(Period(number))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> String {
        period_label(u32::from(self.0))
    }

    /// Accepts only the canonical rendering, so `第01节` and `第13节` are rejected.
    pub fn from_canonical(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('第')?.strip_suffix('节')?;
        let period = digits.parse::<u8>().ok().and_then(Period::new)?;
        (period.label() == s).then_some(period)
    }

    pub fn all() -> impl Iterator<Item = Period> {
        (1..=PERIOD_COUNT).map(Period)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "第{}节", self.0)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Renders any period number the way cells spell it, valid or not.
pub fn period_label(number: u32) -> String {
    format!("第{}节", number)
}

/// Which part of the alias table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasScope {
    /// Substring aliases only; used when mapping day columns.
    Labels,
    /// Substring aliases plus whole-cell aliases such as bare `1`; used when
    /// scoring header candidates.
    LabelsAndExact,
}

#[derive(Debug)]
pub struct DayAliases {
    pub day: Day,
    /// Lower-case substrings that identify the day anywhere in a cell.
    pub contains: &'static [&'static str],
    /// Whole-cell values (after trimming) that identify the day.
    pub exact: &'static [&'static str],
}

pub static DAY_ALIASES: [DayAliases; 7] = [
    DayAliases {
        day: Day::Monday,
        contains: &["星期一", "一", "周一", "monday"],
        exact: &["一", "1"],
    },
    DayAliases {
        day: Day::Tuesday,
        contains: &["星期二", "二", "周二", "tuesday"],
        exact: &["二", "2"],
    },
    DayAliases {
        day: Day::Wednesday,
        contains: &["星期三", "三", "周三", "wednesday"],
        exact: &["三", "3"],
    },
    DayAliases {
        day: Day::Thursday,
        contains: &["星期四", "四", "周四", "thursday"],
        exact: &["四", "4"],
    },
    DayAliases {
        day: Day::Friday,
        contains: &["星期五", "五", "周五", "friday"],
        exact: &["五", "5"],
    },
    DayAliases {
        day: Day::Saturday,
        contains: &["星期六", "六", "周六", "saturday"],
        exact: &["六", "6"],
    },
    DayAliases {
        day: Day::Sunday,
        contains: &["星期日", "日", "周日", "星期天", "周天", "sunday"],
        exact: &["日", "7", "0"],
    },
];

/// Fuzzy test of one cell against one day's aliases. Case-insensitive.
pub fn matches_day(cell: &str, day: Day, scope: AliasScope) -> bool {
    let cell = cell.trim();
    if cell.is_empty() {
        return false;
    }
    let lowered = cell.to_lowercase();
    let aliases = day.aliases();
    if aliases.contains.iter().any(|alias| lowered.contains(alias)) {
        return true;
    }
    scope == AliasScope::LabelsAndExact && aliases.exact.iter().any(|alias| lowered == *alias)
}

/// Every day a cell could stand for, in canonical order.
pub fn days_in_cell(cell: &str, scope: AliasScope) -> Vec<Day> {
    Day::ALL
        .into_iter()
        .filter(|day| matches_day(cell, *day, scope))
        .collect()
}

/// `一` through `十二` as used in period columns.
pub fn cjk_numeral(s: &str) -> Option<u8> {
    const NUMERALS: [&str; 12] = [
        "一", "二", "三", "四", "五", "六", "七", "八", "九", "十", "十一", "十二",
    ];
    NUMERALS
        .iter()
        .position(|numeral| *numeral == s)
        .and_then(|idx| u8::try_from(idx + 1).ok())
}
