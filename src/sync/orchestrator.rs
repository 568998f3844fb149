//! Per-container azcopy invocation
//!
//! Containers are processed strictly sequentially. For each one the
//! orchestrator creates the local directory, builds
//! `azcopy sync <source-url> <local-path> [options]` and runs it with both
//! output pipes forwarded line-by-line as they arrive. The two pipe readers
//! are independent tasks joined with the exit wait, so a chatty azcopy can
//! never deadlock on a full pipe buffer.
//!
//! Failure policy: stop on first error. The first nonzero azcopy exit
//! aborts the run and becomes the process exit code. azcopy keeps a resume
//! journal, so rerunning picks up where the failed sync stopped.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, SyncError};
use crate::storage::StorageAccount;

const DEFAULT_EXECUTABLE: &str = "azcopy";

/// One container to mirror: its name and the SAS-scoped source URL
#[derive(Debug, Clone)]
pub struct SyncJob {
    pub container: String,
    pub source_url: Url,
}

/// Build one sync job per container, in listing order
pub fn plan_jobs(account: &StorageAccount, containers: &[String]) -> Vec<SyncJob> {
    containers
        .iter()
        .map(|container| SyncJob {
            container: container.clone(),
            source_url: account.source_url(container),
        })
        .collect()
}

/// Relative destination path for a container, in the current OS path
/// convention (what azcopy receives on its command line).
pub fn local_destination(container: &str) -> String {
    #[cfg(windows)]
    {
        format!(".\\{}", container)
    }
    #[cfg(not(windows))]
    {
        format!("./{}", container)
    }
}

/// Runs azcopy once per container
pub struct SyncOrchestrator {
    executable: String,
    extra_options: Vec<String>,
    what_if: bool,
    working_dir: Option<PathBuf>,
}

impl SyncOrchestrator {
    /// `azcopy_options` is the raw pass-through string from the command
    /// line, split on whitespace into discrete arguments.
    pub fn new(azcopy_options: Option<&str>, what_if: bool) -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            extra_options: azcopy_options
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            what_if,
            working_dir: None,
        }
    }

    /// Override the executable (tests point this at a stub)
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Run from a specific directory instead of the process working
    /// directory; container directories are created beneath it.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command_args(&self, job: &SyncJob) -> Vec<String> {
        let mut args = vec![
            "sync".to_string(),
            job.source_url.to_string(),
            local_destination(&job.container),
        ];
        args.extend(self.extra_options.iter().cloned());
        args
    }

    /// Mirror every container, stopping at the first failure
    pub async fn run_all(&self, jobs: &[SyncJob]) -> Result<()> {
        for job in jobs {
            self.sync_container(job).await?;
        }
        Ok(())
    }

    async fn sync_container(&self, job: &SyncJob) -> Result<()> {
        let base = self
            .working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(base.join(&job.container)).await?;

        debug!("Processing container {}", job.container);
        let args = self.command_args(job);

        if self.what_if {
            // the URL carries the SAS token; What-If output is explicitly
            // opted into, same as the original tool
            info!("What-If: would run {} {}", self.executable, args.join(" "));
            return Ok(());
        }

        debug!("Running command {} {}", self.executable, args.join(" "));

        let mut command = Command::new(&self.executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SyncError::AzCopyNotFound {
                    executable: self.executable.clone(),
                }
            } else {
                e.into()
            }
        })?;

        // Drain both pipes concurrently with the exit wait. The readers
        // finish at pipe EOF, which the child's exit guarantees.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = tokio::spawn(forward_lines(stdout, false));
        let err_task = tokio::spawn(forward_lines(stderr, true));

        let status = child.wait().await?;
        let _ = out_task.await;
        let _ = err_task.await;

        if !status.success() {
            // no exit code means the child died to a signal
            return Err(SyncError::AzCopyFailed {
                container: job.container.clone(),
                code: status.code().unwrap_or(-1),
            });
        }

        info!("Synchronized container {}", job.container);
        Ok(())
    }
}

/// Forward one output pipe line-by-line to the matching console stream
async fn forward_lines<R>(reader: Option<R>, to_stderr: bool)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        return;
    };

    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}
