#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use fpga_toolbench::run_cmd::RunOptions;
use fpga_toolbench::{projects_cmd, run_cmd, versions_cmd};

/// Architecture files checked out by symbiflow-arch-defs, relative to `$HOME`.
const DEFAULT_VPR_ARCH_DIR: &str = "symbiflow-arch-defs/tests/build/ice40-top-routing-virt-hx8k";

#[derive(Parser, Debug)]
#[command(name = "fpga-toolbench")]
#[command(about = "Benchmark FPGA synthesis and place-and-route toolchains", long_about = None)]
struct Cli {
    /// Echo tool output to the terminal and enable debug logging (or set FPGA_TOOLBENCH_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one toolchain over one project and write meta.json
    Run {
        /// Toolchain to run (arachne, vpr)
        #[arg(long)]
        toolchain: String,
        /// Project name (built-in or from --config)
        #[arg(long)]
        project: String,
        #[arg(long, default_value = "ice40")]
        family: String,
        #[arg(long, default_value = "hx8k")]
        device: String,
        /// Output directory (default: build/<family>-<device>_<toolchain>_<project>)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Directory holding arch.xml and rr_graph.real.xml for vpr
        #[arg(long)]
        vpr_arch_dir: Option<PathBuf>,
        /// TOML file with extra projects and tool paths
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also append the result record to this JSONL file
        #[arg(long)]
        jsonl: Option<PathBuf>,
        /// Replace results already present in the output directory
        #[arg(long)]
        overwrite: bool,
    },

    /// List known projects
    Projects {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the tool versions a toolchain would record
    Versions {
        #[arg(long)]
        toolchain: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("FPGA_TOOLBENCH_LOG").unwrap_or_else(|_| {
        if verbose { "fpga_toolbench=debug".to_string() } else { "fpga_toolbench=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::ACTIVE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn default_vpr_arch_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_VPR_ARCH_DIR))
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            toolchain,
            project,
            family,
            device,
            out_dir,
            vpr_arch_dir,
            config,
            jsonl,
            overwrite,
        } => run_cmd::run(RunOptions {
            vpr_arch_dir: vpr_arch_dir.or_else(default_vpr_arch_dir),
            toolchain,
            project,
            family,
            device,
            out_dir,
            config,
            jsonl,
            overwrite,
            verbose: cli.verbose,
        })
        .map(|_| ()),
        Commands::Projects { config } => projects_cmd::run(config),
        Commands::Versions { toolchain, config } => versions_cmd::run(toolchain, config).map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
