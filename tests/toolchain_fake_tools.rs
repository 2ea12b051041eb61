//! End-to-end pipeline runs against shell scripts standing in for the real tools.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use fpga_toolbench::BenchError;
use fpga_toolbench::core::{PipelineConfig, ProjectSpec, ToolPaths, ToolchainKind};
use fpga_toolbench::engine::{RunState, create_toolchain};
use fpga_toolbench::storage::{RESULT_FILE, read_record, write_metadata};
use tempfile::tempdir;

const ICETIME_REPORT: &str = include_str!("fixtures/icetime_report.txt");
const ICEBOX_STAT_REPORT: &str = include_str!("fixtures/icebox_stat_report.txt");

fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, format!("#!/usr/bin/env bash\nset -euo pipefail\n{body}")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
}

/// Populate `dir` with a fake for every tool both flows call.
fn fake_tools(dir: &Path) -> ToolPaths {
    fs::create_dir_all(dir).unwrap();
    write_script(
        dir,
        "yosys",
        r#"if [ "$1" = "-V" ]; then echo "Yosys 0.7+fake"; exit 0; fi
echo "yosys: synthesizing $3"
touch my.blif my.eblif
"#,
    );
    write_script(
        dir,
        "arachne-pnr",
        r#"if [ "$1" = "-v" ]; then echo "arachne-pnr 0.1+fake"; exit 0; fi
echo "arachne-pnr: placing"
touch my.asc
"#,
    );
    write_script(
        dir,
        "vpr",
        r#"if [ "$1" = "--version" ]; then
  echo "VPR FPGA Placement and Routing."
  echo "Version: 8.0.0-dev+fake"
  echo "Revision: fake-rev"
  exit 0
fi
if [ ! -f "$1" ]; then echo "vpr: cannot open architecture file $1" >&2; exit 1; fi
touch top.hlc
"#,
    );
    write_script(dir, "icebox_hlc2asc.py", "echo '.device 8k'\n");
    write_script(dir, "icepack", "touch \"$2\"\n");
    write_script(
        dir,
        "icetime",
        &format!("cat <<'REPORT'\n{ICETIME_REPORT}REPORT\n"),
    );
    write_script(
        dir,
        "icebox_stat",
        &format!("cat <<'REPORT'\n{ICEBOX_STAT_REPORT}REPORT\n"),
    );
    ToolPaths::in_dir(dir)
}

fn blinky(root: &Path) -> ProjectSpec {
    let src = root.join("src/blinky.v");
    fs::create_dir_all(src.parent().unwrap()).unwrap();
    fs::write(&src, "module top(output led); assign led = 1; endmodule\n").unwrap();
    ProjectSpec::new("blinky", vec![src], "top")
}

fn config(root: &Path, out: &str, tools: ToolPaths) -> PipelineConfig {
    let out_dir = root.join(out);
    fs::create_dir_all(&out_dir).unwrap();
    PipelineConfig::new(&blinky(root), "ice40", "hx8k", out_dir).with_tools(tools)
}

#[test]
fn arachne_run_writes_meta_json() {
    let dir = tempdir().unwrap();
    let tools = fake_tools(&dir.path().join("bin"));
    let cfg = config(dir.path(), "build/ice40-hx8k_arachne_blinky", tools);
    let out_dir = cfg.out_dir.clone();

    let mut toolchain = create_toolchain(ToolchainKind::Arachne, cfg, false).unwrap();
    toolchain.run().unwrap();
    assert_eq!(toolchain.pipeline().state(), &RunState::Completed);

    let record = write_metadata(toolchain.as_ref(), dir.path()).unwrap();
    let names: Vec<_> = record.runtime.names().collect();
    assert_eq!(
        names,
        vec!["nop", "yosys", "arachne-pnr", "icepack", "bit-all", "icetime"]
    );
    let inner: f64 = ["yosys", "arachne-pnr", "icepack"]
        .iter()
        .map(|n| record.runtime.get(n).unwrap())
        .sum();
    assert!(record.runtime.get("bit-all").unwrap() >= inner);

    assert_eq!(record.max_freq, Some(124_280_000.0));
    assert_eq!(record.resources.get("LUT"), Some(&24));
    assert_eq!(record.resources.get("DFF"), Some(&22));
    assert_eq!(record.resources.len(), 7);
    assert_eq!(record.sources, vec!["./src/blinky.v".to_string()]);
    assert_eq!(record.versions.get("yosys").unwrap(), "Yosys 0.7+fake");
    assert_eq!(record.versions.get("arachne").unwrap(), "arachne-pnr 0.1+fake");
    assert_eq!(record.toolchain, "arachne");

    let on_disk = read_record(&out_dir.join(RESULT_FILE)).unwrap();
    assert_eq!(on_disk, record);

    let text = fs::read_to_string(out_dir.join(RESULT_FILE)).unwrap();
    assert!(text.starts_with("{\n    \"device\": \"hx8k\",\n"));
    assert!(text.contains("\"max_freq\": 124280000.0"));

    let yosys_log = fs::read_to_string(out_dir.join("yosys.txt")).unwrap();
    assert!(yosys_log.starts_with("Running: "));
    assert!(yosys_log.contains("synth_ice40 -top top -blif my.blif"));
    assert!(out_dir.join("my.bin").exists());
    assert!(out_dir.join("icebox_stat.stderr.txt").exists());
}

#[test]
fn vpr_run_converts_layout() {
    let dir = tempdir().unwrap();
    let tools = fake_tools(&dir.path().join("bin"));
    let arch = dir.path().join("arch");
    fs::create_dir_all(&arch).unwrap();
    fs::write(arch.join("arch.xml"), "<architecture/>").unwrap();
    fs::write(arch.join("rr_graph.real.xml"), "<rr_graph/>").unwrap();
    let cfg = config(dir.path(), "out", tools).with_vpr_arch_dir(&arch);
    let out_dir = cfg.out_dir.clone();

    let mut toolchain = create_toolchain(ToolchainKind::Vpr, cfg, false).unwrap();
    toolchain.run().unwrap();
    let record = write_metadata(toolchain.as_ref(), dir.path()).unwrap();

    let names: Vec<_> = record.runtime.names().collect();
    assert_eq!(
        names,
        vec!["nop", "yosys", "vpr", "icebox_hlc2asc.py", "icepack", "bit-all", "icetime"]
    );
    assert_eq!(
        fs::read_to_string(out_dir.join("my.asc")).unwrap(),
        ".device 8k\n"
    );
    assert_eq!(
        record.versions.get("vpr").unwrap(),
        "Version: 8.0.0-dev+fake, Revision: fake-rev"
    );
    assert!(!record.versions.contains_key("arachne"));
}

#[test]
fn vpr_verbose_run_tees_and_redirects() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("bin");
    let tools = fake_tools(&bin);
    write_script(
        &bin,
        "icebox_hlc2asc.py",
        "echo 'hlc2asc: converting top.hlc' 1>&2\necho '.device 8k'\n",
    );
    let arch = dir.path().join("arch");
    fs::create_dir_all(&arch).unwrap();
    fs::write(arch.join("arch.xml"), "<architecture/>").unwrap();
    let cfg = config(dir.path(), "out", tools).with_vpr_arch_dir(&arch);
    let out_dir = cfg.out_dir.clone();

    let mut toolchain = create_toolchain(ToolchainKind::Vpr, cfg, true).unwrap();
    toolchain.run().unwrap();
    let record = write_metadata(toolchain.as_ref(), dir.path()).unwrap();
    assert_eq!(record.max_freq, Some(124_280_000.0));
    assert_eq!(record.resources.get("LUT"), Some(&24));

    // stdout lands in the layout, stderr in the stage log after the header
    assert_eq!(
        fs::read_to_string(out_dir.join("my.asc")).unwrap(),
        ".device 8k\n"
    );
    let convert_log = fs::read_to_string(out_dir.join("icebox_hlc2asc.py.txt")).unwrap();
    assert!(convert_log.starts_with("Running: "));
    assert!(convert_log.ends_with(" top.hlc > my.asc\n\nhlc2asc: converting top.hlc\n"));
    assert!(!convert_log.contains(".device 8k"));

    let yosys_log = fs::read_to_string(out_dir.join("yosys.txt")).unwrap();
    assert!(yosys_log.contains("yosys: synthesizing"));
    let timing = fs::read_to_string(out_dir.join("icetime.txt")).unwrap();
    assert!(timing.contains("Total path delay: 8.05 ns (124.28 MHz)"));
}

#[test]
fn vpr_missing_architecture_aborts_at_vpr() {
    let dir = tempdir().unwrap();
    let tools = fake_tools(&dir.path().join("bin"));
    let cfg = config(dir.path(), "out", tools).with_vpr_arch_dir(dir.path().join("no-arch"));
    let out_dir = cfg.out_dir.clone();

    let mut toolchain = create_toolchain(ToolchainKind::Vpr, cfg, false).unwrap();
    let err = toolchain.run().unwrap_err();
    match &err {
        BenchError::CommandFailed { stage, .. } => assert_eq!(stage, "vpr"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(toolchain.pipeline().state(), RunState::Aborted(_)));
    assert!(!toolchain.pipeline().runtimes().contains("icepack"));
    assert!(write_metadata(toolchain.as_ref(), dir.path()).is_err());
    assert!(!out_dir.join(RESULT_FILE).exists());

    let log = fs::read_to_string(out_dir.join("vpr.txt")).unwrap();
    assert!(log.contains("cannot open architecture file"));
}

#[test]
fn failing_stage_keeps_log_and_skips_results() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("bin");
    let tools = fake_tools(&bin);
    write_script(&bin, "arachne-pnr", "echo 'fatal: placement failed'\nexit 2\n");
    let cfg = config(dir.path(), "out", tools);
    let out_dir = cfg.out_dir.clone();

    let mut toolchain = create_toolchain(ToolchainKind::Arachne, cfg, false).unwrap();
    let err = toolchain.run().unwrap_err();
    assert!(err.is_command_failure());
    assert!(err.to_string().contains("arachne-pnr.txt"));

    let runtimes = toolchain.pipeline().runtimes();
    assert!(runtimes.contains("arachne-pnr"));
    assert!(runtimes.contains("bit-all"));
    assert!(!runtimes.contains("icepack"));
    assert!(!runtimes.contains("icetime"));

    let log = fs::read_to_string(out_dir.join("arachne-pnr.txt")).unwrap();
    assert!(log.starts_with("Running: "));
    assert!(log.contains("-d 8k -P cm81 -o my.asc my.blif"));
    assert!(log.contains("fatal: placement failed"));
    assert!(!out_dir.join(RESULT_FILE).exists());
}

#[test]
fn missing_frequency_is_null() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("bin");
    let tools = fake_tools(&bin);
    write_script(&bin, "icetime", "echo 'Total number of logic levels: 3'\n");
    let cfg = config(dir.path(), "out", tools);
    let out_dir = cfg.out_dir.clone();

    let mut toolchain = create_toolchain(ToolchainKind::Arachne, cfg, false).unwrap();
    toolchain.run().unwrap();
    let record = write_metadata(toolchain.as_ref(), dir.path()).unwrap();
    assert_eq!(record.max_freq, None);
    let text = fs::read_to_string(out_dir.join(RESULT_FILE)).unwrap();
    assert!(text.contains("\"max_freq\": null"));
}

#[test]
fn repeated_runs_agree_on_identity() {
    let dir = tempdir().unwrap();
    let tools = fake_tools(&dir.path().join("bin"));
    let mut records = Vec::new();
    for out in ["run-a", "run-b"] {
        let cfg = config(dir.path(), out, tools.clone());
        let mut toolchain = create_toolchain(ToolchainKind::Arachne, cfg, false).unwrap();
        toolchain.run().unwrap();
        records.push(write_metadata(toolchain.as_ref(), dir.path()).unwrap());
    }
    let (a, b) = (&records[0], &records[1]);
    assert_eq!(a.toolchain, b.toolchain);
    assert_eq!(a.family, b.family);
    assert_eq!(a.device, b.device);
    assert_eq!(a.top, b.top);
    assert_eq!(a.sources, b.sources);
    assert_eq!(a.resources, b.resources);
    assert!(dir.path().join("run-a").join(RESULT_FILE).exists());
    assert!(dir.path().join("run-b").join(RESULT_FILE).exists());
}

#[test]
fn unsupported_device_spawns_nothing() {
    let dir = tempdir().unwrap();
    let bin: PathBuf = dir.path().join("bin");
    let tools = fake_tools(&bin);
    let mut cfg = config(dir.path(), "out", tools);
    cfg.device = "up5k".into();
    let out_dir = cfg.out_dir.clone();

    let err = create_toolchain(ToolchainKind::Arachne, cfg, false).err().expect("expected create_toolchain to fail");
    assert!(matches!(err, BenchError::Config(_)));
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
}
