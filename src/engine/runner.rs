//! Synchronous execution of external tools with per-stage log files.
//!
//! Every stage gets `<out_dir>/<stage>.txt`, starting with a `Running: ...` header
//! followed by the tool's combined stdout and stderr. There is no timeout: a
//! hung tool hangs the run.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Mutex;

use tracing::info;

use crate::{BenchError, BenchResult};

/// One external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Canonical tool name; names the log file and the runtime entry.
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Send stdout to this file (relative to the output directory) instead of the log.
    pub stdout_to: Option<String>,
}

impl Stage {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Stage {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            stdout_to: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdout_to(mut self, file: impl Into<String>) -> Self {
        self.stdout_to = Some(file.into());
        self
    }

    /// Shell-quoted rendering used for the log header.
    pub fn command_line(&self) -> String {
        let args = shlex::try_join(self.args.iter().map(String::as_str))
            .unwrap_or_else(|_| self.args.join(" "));
        let mut line = format!("{} {}", self.program.display(), args);
        if let Some(file) = &self.stdout_to {
            line.push_str(" > ");
            line.push_str(file);
        }
        line
    }

    fn command(&self, cwd: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(cwd).stdin(Stdio::null());
        cmd
    }

    fn spawn_error(&self, source: io::Error) -> BenchError {
        BenchError::Spawn {
            stage: self.name.clone(),
            program: self.program.display().to_string(),
            source,
        }
    }
}

/// Runs stages inside one output directory.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    out_dir: PathBuf,
    verbose: bool,
}

impl CommandRunner {
    pub fn new(out_dir: impl Into<PathBuf>, verbose: bool) -> Self {
        CommandRunner {
            out_dir: out_dir.into(),
            verbose,
        }
    }

    /// Working directory of every stage.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Log of `stage`: `<out_dir>/<stage>.txt`.
    pub fn log_path(&self, stage: &str) -> PathBuf {
        self.out_dir.join(format!("{stage}.txt"))
    }

    /// Spawn `true` in the output directory to prove processes can be started there.
    pub fn probe(&self) -> BenchResult<()> {
        let stage = Stage::new("nop", "true");
        let status = stage
            .command(&self.out_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| stage.spawn_error(e))?;
        self.check(&stage, status, None)
    }

    /// Run a stage to completion, logging its output. Non-zero exit is an error.
    pub fn run(&self, stage: &Stage) -> BenchResult<()> {
        let command_line = stage.command_line();
        info!("Running: {command_line}");

        let log_path = self.log_path(&stage.name);
        std::fs::write(&log_path, format!("Running: {command_line}\n\n"))?;
        let log = OpenOptions::new().append(true).open(&log_path)?;

        let status = if self.verbose {
            self.run_tee(stage, log)?
        } else {
            self.run_quiet(stage, log)?
        };
        self.check(stage, status, Some(log_path))
    }

    /// Run a stage and write its stdout to `<out_dir>/<stage>.txt` with no header.
    ///
    /// Used for reports that are parsed afterwards. Stderr goes to
    /// `<out_dir>/<stage>.stderr.txt`, and to the terminal as well in verbose mode.
    pub fn capture(&self, stage: &Stage) -> BenchResult<PathBuf> {
        let report = self.log_path(&stage.name);
        let err_log = self.stderr_log_path(&stage.name);
        let file = File::create(&report)?;
        let err_file = File::create(&err_log)?;

        let status = if self.verbose {
            let mut child = stage
                .command(&self.out_dir)
                .stdout(file)
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| stage.spawn_error(e))?;
            let log = Mutex::new(err_file);
            if let Some(stderr) = child.stderr.take() {
                tee(stderr, &log, io::stderr())?;
            }
            child.wait()?
        } else {
            stage
                .command(&self.out_dir)
                .stdout(file)
                .stderr(err_file)
                .status()
                .map_err(|e| stage.spawn_error(e))?
        };
        self.check(stage, status, Some(err_log))?;
        Ok(report)
    }

    /// Diagnostics of a captured stage: `<out_dir>/<stage>.stderr.txt`.
    pub fn stderr_log_path(&self, stage: &str) -> PathBuf {
        self.out_dir.join(format!("{stage}.stderr.txt"))
    }

    fn stdout_file(&self, stage: &Stage) -> io::Result<Option<File>> {
        stage
            .stdout_to
            .as_ref()
            .map(|f| File::create(self.out_dir.join(f)))
            .transpose()
    }

    fn run_quiet(&self, stage: &Stage, log: File) -> BenchResult<ExitStatus> {
        let stdout = match self.stdout_file(stage)? {
            Some(file) => file,
            None => log.try_clone()?,
        };
        stage
            .command(&self.out_dir)
            .stdout(stdout)
            .stderr(log)
            .status()
            .map_err(|e| stage.spawn_error(e))
    }

    fn run_tee(&self, stage: &Stage, log: File) -> BenchResult<ExitStatus> {
        let redirect = self.stdout_file(stage)?;
        let mut cmd = stage.command(&self.out_dir);
        match redirect {
            Some(file) => cmd.stdout(file),
            None => cmd.stdout(Stdio::piped()),
        };
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| stage.spawn_error(e))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let log = Mutex::new(log);

        let (out_res, err_res) = std::thread::scope(|s| {
            let log = &log;
            let out = stdout.map(|r| s.spawn(move || tee(r, log, io::stdout())));
            let err = stderr.map(|r| s.spawn(move || tee(r, log, io::stderr())));
            (out.map(join_reader), err.map(join_reader))
        });
        let status = child.wait()?;
        out_res.transpose()?;
        err_res.transpose()?;
        Ok(status)
    }

    fn check(&self, stage: &Stage, status: ExitStatus, log: Option<PathBuf>) -> BenchResult<()> {
        if status.success() {
            return Ok(());
        }
        Err(BenchError::CommandFailed {
            stage: stage.name.clone(),
            status: status.to_string(),
            log,
        })
    }
}

/// Copy `reader` line by line into the shared log and echo it.
fn tee(reader: impl Read, log: &Mutex<File>, mut echo: impl Write) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        {
            let mut file = log
                .lock()
                .map_err(|_| io::Error::other("stage log lock poisoned"))?;
            file.write_all(&line)?;
        }
        echo.write_all(&line)?;
        echo.flush()?;
    }
}

fn join_reader(handle: std::thread::ScopedJoinHandle<'_, io::Result<()>>) -> io::Result<()> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("output reader panicked")))
}
