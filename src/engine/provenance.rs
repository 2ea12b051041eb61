//! Tool version queries recorded with every result.
//!
//! The icestorm tools (icepack, icetime, icebox_*) have no version flag and are
//! not recorded.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::core::{ToolPaths, ToolchainKind, VersionInfo};
use crate::{BenchError, BenchResult};

/// Versions of every tool `kind` depends on that can report one.
pub fn collect_versions(kind: ToolchainKind, tools: &ToolPaths) -> BenchResult<VersionInfo> {
    let mut versions = VersionInfo::new();
    versions.insert("yosys".to_string(), yosys_version(&tools.yosys)?);
    match kind {
        ToolchainKind::Arachne => {
            versions.insert("arachne".to_string(), arachne_version(&tools.arachne_pnr)?);
        }
        ToolchainKind::Vpr => {
            versions.insert("vpr".to_string(), vpr_version(&tools.vpr)?);
        }
    }
    Ok(versions)
}

/// Run `<program> <args>` and return its trimmed stdout. Non-zero exit is an error.
pub fn query_version(tool: &str, program: &Path, args: &[&str]) -> BenchResult<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| BenchError::Spawn {
            stage: tool.to_string(),
            program: program.display().to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(BenchError::CommandFailed {
            stage: format!("{tool} {}", args.join(" ")),
            status: output.status.to_string(),
            log: None,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// `yosys -V`, e.g. "Yosys 0.7+352 (git sha1 baddb017, clang 3.8.1-24 -fPIC -Os)".
pub fn yosys_version(program: &Path) -> BenchResult<String> {
    query_version("yosys", program, &["-V"])
}

/// `arachne-pnr -v`, e.g. "arachne-pnr 0.1+203+0 (git sha1 7e135ed, g++ 4.8.4 -O2)".
pub fn arachne_version(program: &Path) -> BenchResult<String> {
    query_version("arachne-pnr", program, &["-v"])
}

/// `vpr --version`, reduced to its `Version:` and `Revision:` lines.
pub fn vpr_version(program: &Path) -> BenchResult<String> {
    let out = query_version("vpr", program, &["--version"])?;
    parse_vpr_version(&out).ok_or_else(|| BenchError::Parse {
        path: program.to_path_buf(),
        message: "`vpr --version` printed no Version:/Revision: lines".into(),
    })
}

/// Extract "Version: ..., Revision: ..." from the vpr banner.
///
/// ```text
/// VPR FPGA Placement and Routing.
/// Version: 8.0.0-dev+vpr-7.0.5-6027-g94a747729
/// Revision: vpr-7.0.5-6027-g94a747729
/// Compiled: 2018-06-21T16:45:11 (release build)
/// ```
pub fn parse_vpr_version(output: &str) -> Option<String> {
    let mut version = None;
    let mut revision = None;
    for line in output.lines().map(str::trim) {
        if line.starts_with("Version:") {
            version = Some(line);
        }
        if line.starts_with("Revision:") {
            revision = Some(line);
        }
    }
    Some(format!("{}, {}", version?, revision?))
}
