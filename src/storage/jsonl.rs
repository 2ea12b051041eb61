//! JSON Lines aggregation of result records across runs.
//!
//! `meta.json` holds one run; the aggregation file collects many so that
//! toolchains can be compared side by side.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::core::ResultRecord;
use crate::{BenchError, BenchResult};

/// Append-only log of `ResultRecord`s, one compact JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonlWriter {
    path: PathBuf,
}

impl JsonlWriter {
    /// The file is created on first append.
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonlWriter {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the path to the JSONL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating parent directories as needed.
    pub fn append(&self, record: &ResultRecord) -> BenchResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        // One write per record.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(&line)?;
        Ok(())
    }

    /// Every record in the file, in append order.
    pub fn read_all(&self) -> BenchResult<Vec<ResultRecord>> {
        self.read_filtered(None)
    }

    /// Records in file order, optionally only those for `project`.
    ///
    /// # Errors
    /// A missing file, or any line that is not a valid record.
    pub fn read_filtered(&self, project: Option<&str>) -> BenchResult<Vec<ResultRecord>> {
        let mut records = Vec::new();
        for (idx, line) in self.lines()?.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ResultRecord =
                serde_json::from_str(&line).map_err(|e| BenchError::Parse {
                    path: self.path.clone(),
                    message: format!("line {}: {e}", idx + 1),
                })?;
            if project.is_none_or(|name| record.project_name == name) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Number of non-empty lines; zero when the file does not exist yet.
    pub fn count(&self) -> BenchResult<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let mut count = 0;
        for line in self.lines()? {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn lines(&self) -> BenchResult<std::io::Lines<BufReader<File>>> {
        if !self.path.exists() {
            return Err(BenchError::Message(format!(
                "file not found: {}",
                self.path.display()
            )));
        }
        Ok(BufReader::new(File::open(&self.path)?).lines())
    }
}
