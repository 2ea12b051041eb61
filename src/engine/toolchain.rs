//! Toolchain abstraction for FPGA synthesis and place-and-route flows.
//!
//! A `Toolchain` runs a fixed, linear sequence of external tools for one design
//! and answers questions about what came out:
//! - `run`: execute every stage, aborting on the first failure
//! - `max_freq`: achieved clock frequency from the timing report
//! - `resources`: device utilization of the final layout
//! - `versions`: version strings of the tools the flow depends on
//!
//! The shared plumbing (configuration, runtime record, command runner, the
//! stages both flows end with) lives in `Pipeline`; the variants only decide
//! which stages run and in what order.

use std::path::PathBuf;

use tracing::info;

use crate::core::{
    DeviceTarget, PipelineConfig, ResourceCounts, RuntimeRecord, ToolchainKind, VersionInfo,
};
use crate::parse::{read_max_freq, read_resources};
use crate::{BenchError, BenchResult};

use super::arachne::ArachneToolchain;
use super::runner::{CommandRunner, Stage};
use super::timer::Timed;
use super::vpr::VprToolchain;

/// Placed-and-routed ASCII layout, relative to the output directory.
pub const LAYOUT: &str = "my.asc";
/// Packed bitstream, relative to the output directory.
pub const BITSTREAM: &str = "my.bin";
/// Outer span wrapping every stage up to and including bitstream packing.
pub const ALL_STAGES: &str = "bit-all";
/// Baseline span recorded when a pipeline is created.
pub const BASELINE: &str = "nop";

/// Where a pipeline is in its single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Configured,
    Completed,
    /// Stopped on a failure; no later stage ran.
    Aborted(String),
}

/// Uniform contract over the toolchain variants.
pub trait Toolchain {
    /// Shared pipeline state: configuration, timings, runner.
    fn pipeline(&self) -> &Pipeline;

    /// Which variant this is; fixed when the pipeline was built.
    fn kind(&self) -> ToolchainKind {
        self.pipeline().kind()
    }

    /// Execute the stage sequence. Any failing stage aborts the run.
    fn run(&mut self) -> BenchResult<()>;

    /// Versions of every tool this flow invokes that can report one.
    fn versions(&self) -> BenchResult<VersionInfo>;

    /// Achieved frequency in Hz from the `icetime` report written by `run`.
    ///
    /// `Ok(None)` when the report has no "Total path delay" line.
    fn max_freq(&self) -> BenchResult<Option<f64>> {
        read_max_freq(&self.pipeline().timing_report())
    }

    /// Utilization of the layout written by `run`, via `icebox_stat`.
    fn resources(&self) -> BenchResult<ResourceCounts> {
        let pipeline = self.pipeline();
        let stage = Stage::new("icebox_stat", &pipeline.config().tools.icebox_stat).arg(LAYOUT);
        let report = pipeline.runner().capture(&stage)?;
        read_resources(&report)
    }
}

/// Build the pipeline for `kind`. Configuration errors surface before any process starts.
pub fn create_toolchain(
    kind: ToolchainKind,
    config: PipelineConfig,
    verbose: bool,
) -> BenchResult<Box<dyn Toolchain>> {
    Ok(match kind {
        ToolchainKind::Arachne => Box::new(ArachneToolchain::new(config, verbose)?),
        ToolchainKind::Vpr => Box::new(VprToolchain::new(config, verbose)?),
    })
}

/// State shared by every variant: configuration, timings and the command runner.
#[derive(Debug)]
pub struct Pipeline {
    kind: ToolchainKind,
    config: PipelineConfig,
    target: &'static DeviceTarget,
    runtimes: RuntimeRecord,
    runner: CommandRunner,
    state: RunState,
}

impl Pipeline {
    /// Validate the configuration, then record the `nop` baseline by spawning
    /// `true` inside the output directory.
    pub fn new(kind: ToolchainKind, config: PipelineConfig, verbose: bool) -> BenchResult<Self> {
        let target = config.validate(kind)?;
        let runner = CommandRunner::new(&config.out_dir, verbose);
        let mut pipeline = Pipeline {
            kind,
            config,
            target,
            runtimes: RuntimeRecord::new(),
            runner,
            state: RunState::Configured,
        };
        pipeline.timed(BASELINE, |p| p.runner.probe())?;
        Ok(pipeline)
    }

    /// Variant this pipeline was built for.
    pub fn kind(&self) -> ToolchainKind {
        self.kind
    }

    /// Configuration fixed at construction.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolved family/device entry, with tool-specific part names.
    pub fn target(&self) -> &'static DeviceTarget {
        self.target
    }

    /// Stage timings recorded so far, `nop` first.
    pub fn runtimes(&self) -> &RuntimeRecord {
        &self.runtimes
    }

    /// Runner bound to the output directory.
    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Where the single pass currently stands.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Log of the `icetime` stage, which doubles as the timing report.
    pub fn timing_report(&self) -> PathBuf {
        self.runner.log_path("icetime")
    }

    /// Placed-and-routed layout (`my.asc`) inside the output directory.
    pub fn layout(&self) -> PathBuf {
        self.config.out_dir.join(LAYOUT)
    }

    /// Run one stage, timed under its own name.
    pub fn cmd(&mut self, stage: Stage) -> BenchResult<()> {
        let name = stage.name.clone();
        self.timed(&name, |p| p.runner.run(&stage))
    }

    /// Drive `stages` once, moving to `Completed` or `Aborted`.
    pub fn execute(
        &mut self,
        stages: impl FnOnce(&mut Self) -> BenchResult<()>,
    ) -> BenchResult<()> {
        if self.state != RunState::Configured {
            return Err(BenchError::Message(format!(
                "{} pipeline already ran ({:?})",
                self.kind, self.state
            )));
        }
        info!(
            toolchain = %self.kind,
            project = %self.config.project_name,
            out_dir = %self.config.out_dir.display(),
            "starting pipeline"
        );
        let result = stages(self);
        self.state = match &result {
            Ok(()) => RunState::Completed,
            Err(e) => RunState::Aborted(e.to_string()),
        };
        result
    }

    /// Synthesis with `script` over every project source.
    pub fn yosys_stage(&self, script: String) -> Stage {
        Stage::new("yosys", &self.config.tools.yosys)
            .arg("-p")
            .arg(script)
            .args(self.config.sources.iter().map(|s| s.display().to_string()))
    }

    pub fn icepack_stage(&self) -> Stage {
        Stage::new("icepack", &self.config.tools.icepack).args([LAYOUT, BITSTREAM])
    }

    pub fn icetime_stage(&self) -> Stage {
        Stage::new("icetime", &self.config.tools.icetime)
            .arg("-tmd")
            .arg(self.target.device)
            .arg(LAYOUT)
    }
}

impl Timed for Pipeline {
    fn runtimes_mut(&mut self) -> &mut RuntimeRecord {
        &mut self.runtimes
    }
}
