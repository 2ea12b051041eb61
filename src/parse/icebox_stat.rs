//! Resource counters from an `icebox_stat` report.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::ResourceCounts;
use crate::{BenchError, BenchResult};

/// Counter every utilization report must carry.
pub const REQUIRED_RESOURCE: &str = "LUT";

// DFFs:     22
static COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\w+?)s:\s*(\d+)\s*$").expect("valid regex"));

/// Every `<Name>s: <count>` line, keyed by the singular name. Other lines are skipped.
pub fn parse_resource_lines(report: &str) -> ResourceCounts {
    let mut counts = ResourceCounts::new();
    for line in report.lines() {
        let Some(caps) = COUNTER.captures(line) else {
            continue;
        };
        match caps[2].parse::<u64>() {
            Ok(n) => {
                counts.insert(caps[1].to_string(), n);
            }
            Err(e) => debug!(line, error = %e, "skipping unparsable counter"),
        }
    }
    counts
}

/// Parse a report and require the logic-cell counter.
pub fn parse_resources(report: &str, source: &Path) -> BenchResult<ResourceCounts> {
    let counts = parse_resource_lines(report);
    if !counts.contains_key(REQUIRED_RESOURCE) {
        return Err(BenchError::Parse {
            path: source.to_path_buf(),
            message: format!("no {REQUIRED_RESOURCE} counter in utilization report"),
        });
    }
    Ok(counts)
}

pub fn read_resources(path: &Path) -> BenchResult<ResourceCounts> {
    let report = std::fs::read_to_string(path)?;
    parse_resources(&report, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_lines() {
        let counts = parse_resource_lines("DFFs:     22\nLUTs:     24\nCARRYs:   20\n");
        assert_eq!(counts.get("DFF"), Some(&22));
        assert_eq!(counts.get("LUT"), Some(&24));
        assert_eq!(counts.get("CARRY"), Some(&20));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_unmatched_lines_ignored() {
        let counts = parse_resource_lines("Running: icebox_stat my.asc\n\nLUTs: 3\ngarbage\nIOBs: x\n");
        assert_eq!(counts, ResourceCounts::from([("LUT".to_string(), 3)]));
    }

    #[test]
    fn test_missing_lut_is_fatal() {
        let err = parse_resources("DFFs: 2\nIOBs: 4\n", Path::new("icebox_stat.txt")).unwrap_err();
        assert!(matches!(err, BenchError::Parse { .. }));
        assert!(err.to_string().contains("LUT"));
    }

    #[test]
    fn test_zero_luts_accepted() {
        let counts = parse_resources("LUTs:      0\n", Path::new("r.txt")).unwrap();
        assert_eq!(counts["LUT"], 0);
    }
}
