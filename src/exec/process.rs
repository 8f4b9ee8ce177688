// src/exec/process.rs

//! Real process runner: spawns task commands and captures their output.
//!
//! Output handling follows three rules:
//! - stdout and stderr are merged line by line into the same sinks.
//! - `output_file` is written through a staging temp file and only published
//!   (copied into place) once the process has finished, so readers never see
//!   a half-written file.
//! - `output_stream` is written and flushed after every line, so it can be
//!   tailed while the process runs.
//!
//! Child processes are never killed from here; a shutdown leaves running
//! tasks to finish on their own.

use std::fs::{self, File};
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::Result;

use super::runner::{LaunchSpec, ProcessRunner, RunStatus, RunningTask};

/// Escape sequence some readline-linked tools print when they start on a
/// terminal (notably on macOS). Stripped from every captured line.
const META_MODE_ARTIFACT: &str = "\u{1b}[?1034h";

/// Default [`ProcessRunner`]: spawns real OS processes.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for ShellRunner {
    type Run = RunningProc;

    fn launch(&mut self, spec: LaunchSpec) -> Result<RunningProc> {
        RunningProc::spawn(spec)
    }
}

/// A live task process together with its output sinks.
pub struct RunningProc {
    name: String,
    child: Child,
    stdout: Option<Lines<BufReader<ChildStdout>>>,
    stderr: Option<Lines<BufReader<ChildStderr>>>,
    sinks: OutputSinks,
}

impl RunningProc {
    fn spawn(spec: LaunchSpec) -> Result<Self> {
        let LaunchSpec {
            name,
            argv,
            work_dir,
            output_file,
            output_stream,
        } = spec;

        let Some((program, args)) = argv.split_first() else {
            return Err(anyhow!("task '{name}' produced an empty command").into());
        };

        info!(task = %name, "starting task process");
        debug!(task = %name, argv = ?argv, cwd = ?work_dir, "task command line");

        let mut cmd = Command::new(program);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = &work_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{name}'"))?;

        let stdout = child
            .stdout
            .take()
            .map(|out| BufReader::new(out).lines());
        let stderr = child
            .stderr
            .take()
            .map(|err| BufReader::new(err).lines());
        let sinks = OutputSinks::open(&name, output_file, output_stream);

        Ok(Self {
            name,
            child,
            stdout,
            stderr,
            sinks,
        })
    }

    async fn poll_status(&mut self, wait: Duration) -> RunStatus {
        self.pump(wait).await;

        match self.child.try_wait() {
            Ok(None) => RunStatus::Running,
            Ok(Some(status)) => {
                // One more pass picks up output buffered between the pump
                // above and the exit.
                self.pump(wait).await;
                self.sinks.finalize();
                let code = status.code().unwrap_or(-1);
                debug!(task = %self.name, exit_code = code, "task process exited");
                RunStatus::Exited(code)
            }
            Err(err) => {
                warn!(task = %self.name, error = %err, "cannot query task process status");
                self.sinks.finalize();
                RunStatus::Exited(-1)
            }
        }
    }

    async fn pump(&mut self, wait: Duration) {
        pump_pipe(&mut self.stdout, &mut self.sinks, wait).await;
        pump_pipe(&mut self.stderr, &mut self.sinks, wait).await;
    }
}

impl RunningTask for RunningProc {
    fn poll(
        &mut self,
        wait: Duration,
    ) -> Pin<Box<dyn Future<Output = RunStatus> + Send + '_>> {
        Box::pin(self.poll_status(wait))
    }
}

/// Read lines from one pipe until it goes quiet for `wait` or hits EOF.
///
/// `next_line` is cancel-safe, so a timed-out read does not lose partial
/// data; it will be returned by a later call.
async fn pump_pipe<R>(
    pipe: &mut Option<Lines<BufReader<R>>>,
    sinks: &mut OutputSinks,
    wait: Duration,
) where
    R: AsyncRead + Unpin,
{
    let Some(lines) = pipe.as_mut() else {
        return;
    };
    loop {
        match read_ready_line(lines, wait).await {
            LineRead::Line(raw) => sinks.append_line(&clean_line(&raw)),
            LineRead::Quiet => return,
            LineRead::Eof => break,
        }
    }
    *pipe = None;
}

enum LineRead {
    Line(String),
    Eof,
    Quiet,
}

async fn read_ready_line<R>(
    lines: &mut Lines<BufReader<R>>,
    wait: Duration,
) -> LineRead
where
    R: AsyncRead + Unpin,
{
    match timeout(wait, lines.next_line()).await {
        Err(_) => LineRead::Quiet,
        Ok(Ok(Some(line))) => LineRead::Line(line),
        Ok(Ok(None)) => LineRead::Eof,
        Ok(Err(err)) => {
            debug!(error = %err, "output pipe read error; treating as closed");
            LineRead::Eof
        }
    }
}

/// Drop trailing whitespace and strip the readline escape artifact.
fn clean_line(raw: &str) -> String {
    raw.trim_end().replace(META_MODE_ARTIFACT, "")
}

/// Where captured output lines go while a process runs.
struct OutputSinks {
    name: String,
    staging: Option<NamedTempFile>,
    stream: Option<File>,
    publish_to: Option<PathBuf>,
}

impl OutputSinks {
    /// Open the configured sinks. A sink that cannot be opened is reported
    /// and skipped; the process still runs.
    fn open(
        name: &str,
        output_file: Option<PathBuf>,
        output_stream: Option<PathBuf>,
    ) -> Self {
        let staging = match &output_file {
            None => None,
            Some(dest) => match NamedTempFile::new() {
                Ok(file) => Some(file),
                Err(err) => {
                    warn!(
                        task = %name,
                        path = ?dest,
                        error = %err,
                        "cannot open staging file; output capture disabled"
                    );
                    None
                }
            },
        };

        let stream = output_stream.and_then(|path| match File::create(&path) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(
                    task = %name,
                    path = ?path,
                    error = %err,
                    "cannot open output stream; live output disabled"
                );
                None
            }
        });

        Self {
            name: name.to_string(),
            staging,
            stream,
            publish_to: output_file,
        }
    }

    /// Append one cleaned line to every open sink, flushing as we go so the
    /// stream stays tailable. A sink that fails to write is disabled.
    fn append_line(&mut self, line: &str) {
        if let Some(staging) = self.staging.as_mut() {
            if let Err(err) = writeln!(staging, "{line}").and_then(|()| staging.flush()) {
                warn!(
                    task = %self.name,
                    error = %err,
                    "cannot write staged output; output capture disabled"
                );
                self.staging = None;
            }
        }
        if let Some(stream) = self.stream.as_mut() {
            if let Err(err) = writeln!(stream, "{line}").and_then(|()| stream.flush()) {
                warn!(
                    task = %self.name,
                    error = %err,
                    "cannot write output stream; live output disabled"
                );
                self.stream = None;
            }
        }
    }

    /// Close the stream and publish staged output: copy the staging file to
    /// its destination, then remove the staging file.
    fn finalize(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.flush();
        }

        let staging = self.staging.take();
        let publish_to = self.publish_to.take();
        if let (Some(mut staging), Some(dest)) = (staging, publish_to) {
            let _ = staging.flush();
            if let Err(err) = fs::copy(staging.path(), &dest) {
                warn!(
                    task = %self.name,
                    path = ?dest,
                    error = %err,
                    "cannot publish captured output"
                );
            }
            if let Err(err) = staging.close() {
                debug!(task = %self.name, error = %err, "cannot remove staging file");
            }
        }
    }
}
