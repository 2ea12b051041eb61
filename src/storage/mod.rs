//! Persistence for result records.
//!
//! `meta` writes the per-run `meta.json`; `jsonl` appends records to a shared
//! aggregation file.

pub mod jsonl;
pub mod meta;

// Re-export key types
pub use jsonl::JsonlWriter;
pub use meta::{
    RESULT_FILE, canonicalize_sources, collect_record, read_record, write_metadata, write_record,
};
