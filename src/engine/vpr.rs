//! Detailed placement and routing: yosys -> vpr -> icebox_hlc2asc -> icepack.
//!
//! vpr needs a prebuilt architecture description and routing-resource graph
//! for the device; both are read from `PipelineConfig::vpr_arch_dir`.

use crate::core::{PipelineConfig, ToolchainKind, VersionInfo};
use crate::{BenchError, BenchResult};

use super::provenance::collect_versions;
use super::runner::Stage;
use super::timer::Timed;
use super::toolchain::{ALL_STAGES, LAYOUT, Pipeline, Toolchain};

/// Extended BLIF netlist handed from yosys to vpr.
const NETLIST: &str = "my.eblif";
/// Hierarchical layout vpr leaves behind for the top module.
const HLC_LAYOUT: &str = "top.hlc";
const ARCH_XML: &str = "arch.xml";
const RR_GRAPH_XML: &str = "rr_graph.real.xml";
const ROUTE_CHAN_WIDTH: &str = "100";

#[derive(Debug)]
pub struct VprToolchain {
    pipeline: Pipeline,
}

impl VprToolchain {
    pub fn new(config: PipelineConfig, verbose: bool) -> BenchResult<Self> {
        Ok(VprToolchain {
            pipeline: Pipeline::new(ToolchainKind::Vpr, config, verbose)?,
        })
    }

    fn synth_stage(&self) -> Stage {
        let top = &self.pipeline.config().top;
        self.pipeline.yosys_stage(format!(
            "synth_ice40 -top {top} -nocarry; ice40_opt -unlut; abc -lut 4; opt_clean; \
             write_blif -attr -cname -param {NETLIST}"
        ))
    }

    fn route_stage(&self) -> BenchResult<Stage> {
        let config = self.pipeline.config();
        let arch_dir = config.vpr_arch_dir.as_ref().ok_or_else(|| {
            BenchError::Config("the vpr toolchain requires an architecture directory".into())
        })?;
        Ok(Stage::new("vpr", &config.tools.vpr)
            .arg(arch_dir.join(ARCH_XML).display().to_string())
            .arg(NETLIST)
            .args(["--device".to_string(), self.pipeline.target().vpr_device()])
            .args(["--min_route_chan_width_hint", ROUTE_CHAN_WIDTH])
            .args(["--route_chan_width", ROUTE_CHAN_WIDTH])
            .arg("--read_rr_graph")
            .arg(arch_dir.join(RR_GRAPH_XML).display().to_string())
            .args(["--debug_clustering", "on"])
            .args(["--pack", "--place", "--route"]))
    }

    fn convert_stage(&self) -> Stage {
        Stage::new(
            "icebox_hlc2asc.py",
            &self.pipeline.config().tools.icebox_hlc2asc,
        )
        .arg(HLC_LAYOUT)
        .stdout_to(LAYOUT)
    }
}

impl Toolchain for VprToolchain {
    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn run(&mut self) -> BenchResult<()> {
        let synth = self.synth_stage();
        let route = self.route_stage()?;
        let convert = self.convert_stage();
        let pack = self.pipeline.icepack_stage();
        let timing = self.pipeline.icetime_stage();
        self.pipeline.execute(|p| {
            p.timed(ALL_STAGES, |p| {
                p.cmd(synth)?;
                p.cmd(route)?;
                p.cmd(convert)?;
                p.cmd(pack)
            })?;
            p.cmd(timing)
        })
    }

    fn versions(&self) -> BenchResult<VersionInfo> {
        collect_versions(ToolchainKind::Vpr, &self.pipeline.config().tools)
    }
}
