//! Structural discovery: which row is the header, where the period labels
//! live, and which column belongs to which day.

pub mod columns;
pub mod header;

pub use columns::{map_day_columns, ColumnMap};
pub use header::{locate_header, HeaderInfo, HeaderMatch};
