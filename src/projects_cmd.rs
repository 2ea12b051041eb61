use std::path::PathBuf;

use crate::BenchResult;
use crate::run_cmd::load_environment;

pub fn run(config: Option<PathBuf>) -> BenchResult<()> {
    let cwd = std::env::current_dir()?;
    let (registry, _) = load_environment(config.as_deref(), &cwd)?;
    for project in registry.iter() {
        println!(
            "{:<20} top={:<12} sources={}",
            project.name,
            project.top,
            project.sources.len()
        );
    }
    Ok(())
}
