// src/cell/rules.rs

//! Ordered, first-match-wins rule chains.
//!
//! Each rule is a named matcher returning an optional capture. A chain is just
//! a slice of rules tried in order, which keeps every rule testable on its own
//! and keeps the extraction code free of nested conditionals.

use regex::{Captures, Regex};
use tracing::trace;

/// How a rule finds its value.
pub enum Matcher {
    /// A regex plus a function picking the value out of its captures.
    Pattern {
        regex: Regex,
        extract: fn(&Captures<'_>) -> Option<String>,
    },
    /// A hand-written scanner, for patterns a regex without look-around
    /// cannot express.
    Scan(fn(&str) -> Option<String>),
}

pub struct Rule {
    pub name: &'static str,
    matcher: Matcher,
}

impl Rule {
    /// Build a regex rule. Patterns are static, so an invalid one is a bug.
    pub fn pattern(
        name: &'static str,
        pattern: &str,
        extract: fn(&Captures<'_>) -> Option<String>,
    ) -> Self {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|err| panic!("rule `{}` has an invalid pattern: {}", name, err));
        Self {
            name,
            matcher: Matcher::Pattern { regex, extract },
        }
    }

    pub fn scan(name: &'static str, scan: fn(&str) -> Option<String>) -> Self {
        Self {
            name,
            matcher: Matcher::Scan(scan),
        }
    }

    /// Value of this rule's first match in `text`, if any.
    pub fn apply(&self, text: &str) -> Option<String> {
        let value = match &self.matcher {
            Matcher::Pattern { regex, extract } => regex.captures(text).and_then(|c| extract(&c)),
            Matcher::Scan(scan) => scan(text),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Run a chain and return the first value `accept` agrees with, together with
/// the name of the rule that produced it.
pub fn first_match<'r, F>(rules: &'r [Rule], text: &str, accept: F) -> Option<(&'r str, String)>
where
    F: Fn(&str) -> bool,
{
    rules.iter().find_map(|rule| {
        let value = rule.apply(text)?;
        if accept(&value) {
            trace!(rule = rule.name, value = %value, "rule matched");
            Some((rule.name, value))
        } else {
            trace!(rule = rule.name, value = %value, "rule matched but value was refused");
            None
        }
    })
}

/// Capture group 1, trimmed.
pub fn group1(c: &Captures<'_>) -> Option<String> {
    c.get(1).map(|m| m.as_str().trim().to_string())
}

/// Capture group 2, trimmed.
pub fn group2(c: &Captures<'_>) -> Option<String> {
    c.get(2).map(|m| m.as_str().trim().to_string())
}
