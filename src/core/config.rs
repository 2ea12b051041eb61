//! Run configuration: toolchain selection, target device, tool binaries.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::core::project::ProjectSpec;
use crate::{BenchError, BenchResult};

/// A family/device pair the pipelines know how to target, with the
/// tool-specific spellings of its part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTarget {
    pub family: &'static str,
    pub device: &'static str,
    /// Package passed to the placers.
    pub package: &'static str,
    /// Device size as arachne-pnr spells it (`-d`).
    pub arachne_size: &'static str,
}

impl DeviceTarget {
    /// Part name as vpr spells it, e.g. `hx8k-cm81`.
    pub fn vpr_device(&self) -> String {
        format!("{}-{}", self.device, self.package)
    }
}

pub const SUPPORTED_DEVICES: &[DeviceTarget] = &[DeviceTarget {
    family: "ice40",
    device: "hx8k",
    package: "cm81",
    arachne_size: "8k",
}];

/// Toolchain identifiers reserved for future variants.
const RESERVED_TOOLCHAINS: &[&str] = &["icecube", "radiant"];

/// The implemented toolchain pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolchainKind {
    /// yosys -> arachne-pnr -> icepack
    Arachne,
    /// yosys -> vpr -> icebox_hlc2asc -> icepack
    Vpr,
}

impl ToolchainKind {
    pub const ALL: [ToolchainKind; 2] = [ToolchainKind::Arachne, ToolchainKind::Vpr];

    pub fn id(self) -> &'static str {
        match self {
            ToolchainKind::Arachne => "arachne",
            ToolchainKind::Vpr => "vpr",
        }
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ToolchainKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arachne" => Ok(ToolchainKind::Arachne),
            "vpr" => Ok(ToolchainKind::Vpr),
            other if RESERVED_TOOLCHAINS.contains(&other) => Err(BenchError::Config(format!(
                "toolchain '{other}' is not implemented"
            ))),
            other => Err(BenchError::Config(format!(
                "unknown toolchain '{other}' (expected one of: arachne, vpr)"
            ))),
        }
    }
}

/// Program paths for every external tool. Defaults resolve through `PATH`.
///
/// Keys are kebab-case; the underscore spelling of each tool name is accepted
/// too. Unknown keys are rejected so a typo never falls back to `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ToolPaths {
    pub yosys: PathBuf,
    #[serde(alias = "arachne_pnr")]
    pub arachne_pnr: PathBuf,
    pub vpr: PathBuf,
    #[serde(alias = "icebox_hlc2asc", alias = "icebox_hlc2asc.py")]
    pub icebox_hlc2asc: PathBuf,
    pub icepack: PathBuf,
    pub icetime: PathBuf,
    #[serde(alias = "icebox_stat")]
    pub icebox_stat: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            yosys: PathBuf::from("yosys"),
            arachne_pnr: PathBuf::from("arachne-pnr"),
            vpr: PathBuf::from("vpr"),
            icebox_hlc2asc: PathBuf::from("icebox_hlc2asc.py"),
            icepack: PathBuf::from("icepack"),
            icetime: PathBuf::from("icetime"),
            icebox_stat: PathBuf::from("icebox_stat"),
        }
    }
}

impl ToolPaths {
    /// Anchor relative paths that name a location (contain a separator) at
    /// `root`; bare names keep resolving through `PATH`. Stages run with the
    /// output directory as their working directory, so relative locations
    /// would otherwise point somewhere else.
    pub fn resolve_against(self, root: &Path) -> Self {
        let fix = |p: PathBuf| {
            if p.is_relative() && p.components().count() > 1 {
                root.join(p)
            } else {
                p
            }
        };
        ToolPaths {
            yosys: fix(self.yosys),
            arachne_pnr: fix(self.arachne_pnr),
            vpr: fix(self.vpr),
            icebox_hlc2asc: fix(self.icebox_hlc2asc),
            icepack: fix(self.icepack),
            icetime: fix(self.icetime),
            icebox_stat: fix(self.icebox_stat),
        }
    }

    /// Point every tool at `<dir>/<default name>`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let defaults = ToolPaths::default();
        ToolPaths {
            yosys: dir.join(defaults.yosys),
            arachne_pnr: dir.join(defaults.arachne_pnr),
            vpr: dir.join(defaults.vpr),
            icebox_hlc2asc: dir.join(defaults.icebox_hlc2asc),
            icepack: dir.join(defaults.icepack),
            icetime: dir.join(defaults.icetime),
            icebox_stat: dir.join(defaults.icebox_stat),
        }
    }
}

/// Everything a pipeline needs to know about one run. Fixed once the pipeline is built.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub family: String,
    pub device: String,
    pub project_name: String,
    pub sources: Vec<PathBuf>,
    pub top: String,
    pub out_dir: PathBuf,
    /// Directory holding `arch.xml` and `rr_graph.real.xml` for the vpr flow.
    pub vpr_arch_dir: Option<PathBuf>,
    pub tools: ToolPaths,
}

impl PipelineConfig {
    pub fn new(
        project: &ProjectSpec,
        family: impl Into<String>,
        device: impl Into<String>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        PipelineConfig {
            family: family.into(),
            device: device.into(),
            project_name: project.name.clone(),
            sources: project.sources.clone(),
            top: project.top.clone(),
            out_dir: out_dir.into(),
            vpr_arch_dir: None,
            tools: ToolPaths::default(),
        }
    }

    pub fn with_vpr_arch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.vpr_arch_dir = Some(dir.into());
        self
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// The supported target matching `family`/`device`.
    pub fn target(&self) -> BenchResult<&'static DeviceTarget> {
        SUPPORTED_DEVICES
            .iter()
            .find(|t| t.family == self.family && t.device == self.device)
            .ok_or_else(|| {
                BenchError::Config(format!(
                    "family/device {}/{} is not supported",
                    self.family, self.device
                ))
            })
    }

    /// Reject combinations no pipeline can run.
    pub fn validate(&self, kind: ToolchainKind) -> BenchResult<&'static DeviceTarget> {
        let target = self.target()?;
        if kind == ToolchainKind::Vpr && self.vpr_arch_dir.is_none() {
            return Err(BenchError::Config(
                "the vpr toolchain requires an architecture directory".into(),
            ));
        }
        Ok(target)
    }
}

/// Default output directory for a run: `build/<family>-<device>_<toolchain>_<project>`.
pub fn default_out_dir(family: &str, device: &str, toolchain: &str, project: &str) -> PathBuf {
    PathBuf::from("build").join(format!("{family}-{device}_{toolchain}_{project}"))
}
