//! Named hardware designs and the optional TOML configuration file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::core::config::ToolPaths;
use crate::{BenchError, BenchResult};

/// A design to push through a toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub name: String,
    /// Verilog sources, in the order handed to synthesis.
    pub sources: Vec<PathBuf>,
    pub top: String,
}

impl ProjectSpec {
    pub fn new(name: impl Into<String>, sources: Vec<PathBuf>, top: impl Into<String>) -> Self {
        ProjectSpec {
            name: name.into(),
            sources,
            top: top.into(),
        }
    }
}

/// Lookup table of projects, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: Vec<ProjectSpec>,
}

impl ProjectRegistry {
    /// The designs shipped with the benchmark, rooted at `root`.
    pub fn builtin(root: &Path) -> Self {
        let picorv32 = root.join("src/picorv32");
        ProjectRegistry {
            projects: vec![
                ProjectSpec::new("blinky", vec![root.join("src/blinky.v")], "top"),
                ProjectSpec::new(
                    "picosoc-hx8kdemo",
                    vec![
                        picorv32.join("picosoc/picosoc.v"),
                        picorv32.join("picorv32.v"),
                        picorv32.join("picosoc/spimemio.v"),
                        picorv32.join("picosoc/simpleuart.v"),
                        picorv32.join("picosoc/hx8kdemo.v"),
                    ],
                    "hx8kdemo",
                ),
            ],
        }
    }

    /// Add a project, replacing any existing one with the same name.
    pub fn insert(&mut self, project: ProjectSpec) {
        match self.projects.iter_mut().find(|p| p.name == project.name) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
    }

    pub fn get(&self, name: &str) -> BenchResult<&ProjectSpec> {
        self.projects.iter().find(|p| p.name == name).ok_or_else(|| {
            let known: Vec<_> = self.projects.iter().map(|p| p.name.as_str()).collect();
            BenchError::Config(format!(
                "unknown project '{name}' (known: {})",
                known.join(", ")
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectSpec> {
        self.projects.iter()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    name: String,
    srcs: Vec<PathBuf>,
    top: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default, rename = "project")]
    projects: Vec<RawProject>,
    #[serde(default)]
    tools: Option<ToolPaths>,
}

/// Contents of a `--config` file.
#[derive(Debug, Clone, Default)]
pub struct BenchConfig {
    pub projects: Vec<ProjectSpec>,
    pub tools: Option<ToolPaths>,
}

/// Parse a configuration file body. Relative source paths are joined onto `root`.
pub fn parse_bench_config(text: &str, root: &Path) -> BenchResult<BenchConfig> {
    let raw: RawConfig = toml::from_str(text).context("invalid configuration file")?;
    let projects = raw
        .projects
        .into_iter()
        .map(|p| {
            let sources = p
                .srcs
                .into_iter()
                .map(|s| if s.is_absolute() { s } else { root.join(s) })
                .collect();
            ProjectSpec::new(p.name, sources, p.top)
        })
        .collect();
    Ok(BenchConfig {
        projects,
        tools: raw.tools.map(|t| t.resolve_against(root)),
    })
}

pub fn load_bench_config(path: &Path, root: &Path) -> BenchResult<BenchConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_bench_config(&text, root)
}
