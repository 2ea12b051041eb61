use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::{
    PipelineConfig, ProjectRegistry, ResultRecord, ToolPaths, ToolchainKind, default_out_dir,
    load_bench_config,
};
use crate::engine::create_toolchain;
use crate::storage::{JsonlWriter, RESULT_FILE, write_metadata};
use crate::{BenchError, BenchResult};

/// Everything the `run` subcommand needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub toolchain: String,
    pub project: String,
    pub family: String,
    pub device: String,
    pub out_dir: Option<PathBuf>,
    pub vpr_arch_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub jsonl: Option<PathBuf>,
    pub overwrite: bool,
    pub verbose: bool,
}

/// Registry and tool paths after merging the optional configuration file.
pub fn load_environment(
    config: Option<&Path>,
    cwd: &Path,
) -> BenchResult<(ProjectRegistry, ToolPaths)> {
    let mut registry = ProjectRegistry::builtin(cwd);
    let mut tools = ToolPaths::default();
    if let Some(path) = config {
        let file = load_bench_config(path, cwd)?;
        for project in file.projects {
            registry.insert(project);
        }
        if let Some(t) = file.tools {
            tools = t;
        }
    }
    Ok((registry, tools))
}

pub fn run(opts: RunOptions) -> BenchResult<ResultRecord> {
    let kind: ToolchainKind = opts.toolchain.parse()?;
    let cwd = std::env::current_dir()?;
    let (registry, tools) = load_environment(opts.config.as_deref(), &cwd)?;
    let project = registry.get(&opts.project)?;

    let out_dir = opts.out_dir.clone().unwrap_or_else(|| {
        default_out_dir(&opts.family, &opts.device, kind.id(), &project.name)
    });
    let out_dir = cwd.join(out_dir);

    let mut config = PipelineConfig::new(project, &opts.family, &opts.device, &out_dir)
        .with_tools(tools);
    if let Some(dir) = &opts.vpr_arch_dir {
        config = config.with_vpr_arch_dir(cwd.join(dir));
    }
    config.validate(kind)?;

    prepare_out_dir(&out_dir, opts.overwrite)?;
    info!("Writing to {}", out_dir.display());

    let mut toolchain = create_toolchain(kind, config, opts.verbose)?;
    toolchain.run()?;
    let record = write_metadata(toolchain.as_ref(), &cwd)?;

    print!("{}", format_summary(&record));

    if let Some(path) = &opts.jsonl {
        let writer = JsonlWriter::new(cwd.join(path));
        writer.append(&record)?;
        info!(path = %writer.path().display(), "appended result record");
    }
    Ok(record)
}

/// Create the output directory; refuse one that already holds results unless overwriting.
fn prepare_out_dir(out_dir: &Path, overwrite: bool) -> BenchResult<()> {
    let result = out_dir.join(RESULT_FILE);
    if result.exists() {
        if !overwrite {
            return Err(BenchError::Config(format!(
                "{} already exists; pass --overwrite or choose another --out-dir",
                result.display()
            )));
        }
        std::fs::remove_file(&result)?;
    }
    std::fs::create_dir_all(out_dir)?;
    Ok(())
}

/// Human-readable timing, frequency and utilization table.
pub fn format_summary(record: &ResultRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Timing ({}-{}_{}_{})",
        record.family, record.device, record.toolchain, record.project_name
    );
    for (stage, secs) in record.runtime.iter() {
        let _ = writeln!(out, "  {:<16} {:.3}", format!("{stage}:"), secs);
    }
    match record.max_freq {
        Some(hz) => {
            let _ = writeln!(out, "Max frequency: {:.3} MHz", hz / 1e6);
        }
        None => {
            let _ = writeln!(out, "Max frequency: n/a");
        }
    }
    let _ = writeln!(out, "Resource utilization");
    for (resource, count) in &record.resources {
        let _ = writeln!(out, "  {:<20} {}", format!("{resource}:"), count);
    }
    out
}
