//! Assembles the `ResultRecord` for a completed pipeline and writes `meta.json`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::ResultRecord;
use crate::engine::{RunState, Toolchain};
use crate::{BenchError, BenchResult};

/// Name of the result file inside the output directory.
pub const RESULT_FILE: &str = "meta.json";

/// Rewrite sources under `cwd` as `./<relative>` (`cwd` itself becomes `.`);
/// anything else is kept verbatim.
pub fn canonicalize_sources(sources: &[PathBuf], cwd: &Path) -> Vec<String> {
    sources
        .iter()
        .map(|src| match src.strip_prefix(cwd) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => Path::new(".").join(rel).display().to_string(),
            Err(_) => src.display().to_string(),
        })
        .collect()
}

/// Build the record for a pipeline whose `run` succeeded.
///
/// Re-runs both parsers, which for resources means invoking `icebox_stat` again.
pub fn collect_record(toolchain: &dyn Toolchain, cwd: &Path) -> BenchResult<ResultRecord> {
    let pipeline = toolchain.pipeline();
    if pipeline.state() != &RunState::Completed {
        return Err(BenchError::Message(format!(
            "refusing to write results for a pipeline in state {:?}",
            pipeline.state()
        )));
    }
    let config = pipeline.config();
    Ok(ResultRecord {
        device: config.device.clone(),
        family: config.family.clone(),
        max_freq: toolchain.max_freq()?,
        project_name: config.project_name.clone(),
        resources: toolchain.resources()?,
        runtime: pipeline.runtimes().clone(),
        sources: canonicalize_sources(&config.sources, cwd),
        toolchain: toolchain.kind().id().to_string(),
        top: config.top.clone(),
        versions: toolchain.versions()?,
    })
}

/// Serialize `record` into `<out_dir>/meta.json` with 4-space indentation.
pub fn write_record(record: &ResultRecord, out_dir: &Path) -> BenchResult<PathBuf> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut ser)?;
    buf.push(b'\n');

    let path = out_dir.join(RESULT_FILE);
    std::fs::write(&path, buf)?;
    info!(path = %path.display(), "wrote result record");
    Ok(path)
}

/// Collect and write in one go.
pub fn write_metadata(toolchain: &dyn Toolchain, cwd: &Path) -> BenchResult<ResultRecord> {
    let record = collect_record(toolchain, cwd)?;
    write_record(&record, &toolchain.pipeline().config().out_dir)?;
    Ok(record)
}

pub fn read_record(path: &Path) -> BenchResult<ResultRecord> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
