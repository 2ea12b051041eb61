use std::path::PathBuf;

use crate::BenchResult;
use crate::core::{ToolchainKind, VersionInfo};
use crate::engine::provenance::collect_versions;
use crate::run_cmd::load_environment;

/// Print the tool versions a toolchain would record, as JSON.
pub fn run(toolchain: String, config: Option<PathBuf>) -> BenchResult<VersionInfo> {
    let kind: ToolchainKind = toolchain.parse()?;
    let cwd = std::env::current_dir()?;
    let (_, tools) = load_environment(config.as_deref(), &cwd)?;
    let versions = collect_versions(kind, &tools)?;
    println!("{}", serde_json::to_string_pretty(&versions)?);
    Ok(versions)
}
