// src/lib.rs

pub mod assemble;
pub mod calendar;
pub mod cell;
pub mod config;
pub mod course;
pub mod error;
pub mod layout;
pub mod schedule;
pub mod sheet;
pub mod slots;
pub mod validate;
pub mod weeks;

pub use assemble::{import_bytes, import_path, parse_matrix, ImportReport};
pub use config::ImportConfig;
pub use course::{Course, IdGenerator, SequentialIds, TimestampIds};
pub use error::{Diagnostic, ImportError, SkipReason};
pub use schedule::{Schedule, ScheduleError};
pub use validate::{validate_course, validate_time_conflict};
