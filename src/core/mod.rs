//! Core types for fpga-toolbench.
//!
//! Run configuration, the project registry and the `ResultRecord` schema written for every run.

pub mod config;
pub mod project;
pub mod schema;

// Re-export key types for convenience
pub use config::{DeviceTarget, PipelineConfig, ToolPaths, ToolchainKind, default_out_dir};
pub use project::{BenchConfig, ProjectRegistry, ProjectSpec, load_bench_config};
pub use schema::{ResourceCounts, ResultRecord, RuntimeRecord, VersionInfo};
