//! Line-oriented scrapers for tool reports.
//!
//! Each parser recognises exactly one line shape and ignores everything else.

pub mod icebox_stat;
pub mod icetime;

pub use icebox_stat::{REQUIRED_RESOURCE, parse_resource_lines, parse_resources, read_resources};
pub use icetime::{parse_max_freq, read_max_freq};
