//! Fast local place-and-route: yosys -> arachne-pnr -> icepack.

use crate::BenchResult;
use crate::core::{PipelineConfig, ToolchainKind, VersionInfo};

use super::provenance::collect_versions;
use super::runner::Stage;
use super::timer::Timed;
use super::toolchain::{ALL_STAGES, LAYOUT, Pipeline, Toolchain};

/// BLIF netlist handed from yosys to arachne-pnr.
const NETLIST: &str = "my.blif";

#[derive(Debug)]
pub struct ArachneToolchain {
    pipeline: Pipeline,
}

impl ArachneToolchain {
    pub fn new(config: PipelineConfig, verbose: bool) -> BenchResult<Self> {
        Ok(ArachneToolchain {
            pipeline: Pipeline::new(ToolchainKind::Arachne, config, verbose)?,
        })
    }

    fn synth_stage(&self) -> Stage {
        let top = &self.pipeline.config().top;
        self.pipeline
            .yosys_stage(format!("synth_ice40 -top {top} -blif {NETLIST}"))
    }

    fn pnr_stage(&self) -> Stage {
        let target = self.pipeline.target();
        Stage::new("arachne-pnr", &self.pipeline.config().tools.arachne_pnr)
            .args(["-d", target.arachne_size, "-P", target.package])
            .args(["-o", LAYOUT, NETLIST])
    }
}

impl Toolchain for ArachneToolchain {
    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn run(&mut self) -> BenchResult<()> {
        let synth = self.synth_stage();
        let pnr = self.pnr_stage();
        let pack = self.pipeline.icepack_stage();
        let timing = self.pipeline.icetime_stage();
        self.pipeline.execute(|p| {
            p.timed(ALL_STAGES, |p| {
                p.cmd(synth)?;
                p.cmd(pnr)?;
                p.cmd(pack)
            })?;
            p.cmd(timing)
        })
    }

    fn versions(&self) -> BenchResult<VersionInfo> {
        collect_versions(ToolchainKind::Arachne, &self.pipeline.config().tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProjectSpec;
    use std::path::PathBuf;

    fn toolchain(dir: &std::path::Path) -> ArachneToolchain {
        let project = ProjectSpec::new("blinky", vec![PathBuf::from("/work/src/blinky.v")], "top");
        ArachneToolchain::new(PipelineConfig::new(&project, "ice40", "hx8k", dir), false).unwrap()
    }

    #[test]
    fn test_synth_script() {
        let dir = tempfile::tempdir().unwrap();
        let t = toolchain(dir.path());
        assert_eq!(
            t.synth_stage().args,
            vec!["-p", "synth_ice40 -top top -blif my.blif", "/work/src/blinky.v"]
        );
    }

    #[test]
    fn test_pnr_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let t = toolchain(dir.path());
        let stage = t.pnr_stage();
        assert_eq!(stage.name, "arachne-pnr");
        assert_eq!(
            stage.args,
            vec!["-d", "8k", "-P", "cm81", "-o", "my.asc", "my.blif"]
        );
    }
}
