//! Everything that happens inside a single cell: splitting it into course
//! blocks and pulling fields out of each block.

pub mod fields;
pub mod rules;
pub mod segment;

pub use fields::{ExtractedEntry, FieldExtractor};
pub use segment::segment_cell;
