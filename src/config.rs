// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::{debug, info};

use crate::layout::header::DEFAULT_SCAN_ROWS;
use crate::validate::{ValidationDefaults, DEFAULT_WEEKS, UNKNOWN_LOCATION, UNKNOWN_TEACHER};
use crate::weeks::{self, WeekCompaction};

/// Environment override for [`ImportConfig::strict`].
pub const STRICT_ENV: &str = "COURSEGRID_STRICT";

/// Knobs for one import. Every field has a default, so an empty YAML file is
/// a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// How many leading rows are considered when looking for the header.
    pub header_scan_rows: usize,
    /// Reject records with missing teacher/location/weeks instead of filling them.
    pub strict: bool,
    pub default_weeks: String,
    pub unknown_teacher: String,
    pub unknown_location: String,
    pub week_compaction: WeekCompaction,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: DEFAULT_SCAN_ROWS,
            strict: false,
            default_weeks: DEFAULT_WEEKS.to_string(),
            unknown_teacher: UNKNOWN_TEACHER.to_string(),
            unknown_location: UNKNOWN_LOCATION.to_string(),
            week_compaction: WeekCompaction::default(),
        }
    }
}

impl ImportConfig {
    /// Read a YAML config from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {:?}", path))?;
        let config = Self::from_yaml(&text).with_context(|| format!("parsing config {:?}", path))?;
        info!(path = %path.display(), "loaded import config");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // an empty document deserializes to unit, not to a map
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.check()?;
        Ok(config)
    }

    /// Apply `COURSEGRID_STRICT` (`1`/`true`/`yes` or `0`/`false`/`no`).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = env::var(STRICT_ENV) {
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.strict = true,
                "0" | "false" | "no" => self.strict = false,
                other => debug!(value = other, "ignoring unrecognised {}", STRICT_ENV),
            }
        }
        self
    }

    pub fn validation_defaults(&self) -> ValidationDefaults {
        ValidationDefaults {
            teacher: self.unknown_teacher.clone(),
            location: self.unknown_location.clone(),
            weeks: self.default_weeks.clone(),
        }
    }

    fn check(&self) -> Result<()> {
        if !weeks::is_valid_format(&self.default_weeks) {
            bail!(
                "default_weeks `{}` is not a valid week range",
                self.default_weeks
            );
        }
        if self.unknown_teacher.trim().is_empty() || self.unknown_location.trim().is_empty() {
            bail!("unknown_teacher and unknown_location must not be blank");
        }
        Ok(())
    }
}
