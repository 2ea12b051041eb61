//! Maximum frequency from an `icetime` timing report.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::BenchResult;

// Total path delay: 8.05 ns (124.28 MHz)
static PATH_DELAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Total path delay: \S+ \S+ \(([0-9]*\.?[0-9]+) MHz\)").expect("valid regex")
});

/// Achieved clock frequency in Hz from the first "Total path delay" line, if any.
pub fn parse_max_freq(report: &str) -> Option<f64> {
    report.lines().find_map(|line| {
        let caps = PATH_DELAY.captures(line)?;
        let mhz: f64 = caps[1].parse().ok()?;
        debug!(mhz, "found path delay line");
        Some(mhz * 1e6)
    })
}

/// Read a report file and parse it; a missing delay line yields `Ok(None)`.
pub fn read_max_freq(path: &Path) -> BenchResult<Option<f64>> {
    let report = std::fs::read_to_string(path)?;
    let freq = parse_max_freq(&report);
    if freq.is_none() {
        warn!(report = %path.display(), "timing report has no total path delay line");
    }
    Ok(freq)
}
