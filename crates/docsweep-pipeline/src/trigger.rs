//! Sweep triggers.
//!
//! A trigger starts one sweep and returns once it has finished. The consumer
//! awaits every trigger before reading the next record, so at most one sweep
//! runs at a time.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{PipelineError, Result};
use crate::sweep::{SweepPipeline, SweepReport};

/// How a triggered sweep ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The sweep reached its end stage. The report is only available when the
    /// sweep ran in-process.
    Completed(Option<SweepReport>),
    /// The sweep started but did not complete.
    Failed(String),
}

impl SweepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SweepOutcome::Completed(_))
    }
}

/// Starts a sweep and waits for it to finish.
#[async_trait]
pub trait SweepTrigger: Send + Sync {
    /// `Err` only when the sweep could not be started at all.
    async fn trigger(&self) -> Result<SweepOutcome>;
}

/// Runs the sweep pipeline on the caller's task.
#[derive(Debug, Clone)]
pub struct InProcessTrigger {
    pipeline: SweepPipeline,
}

impl InProcessTrigger {
    pub fn new(pipeline: SweepPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl SweepTrigger for InProcessTrigger {
    async fn trigger(&self) -> Result<SweepOutcome> {
        match self.pipeline.run().await {
            Ok(report) => Ok(SweepOutcome::Completed(Some(report))),
            Err(e) => Ok(SweepOutcome::Failed(e.to_string())),
        }
    }
}

/// Runs the sweep as a child process and waits for it to exit.
///
/// Exit status 0 means the sweep completed.
#[derive(Debug, Clone)]
pub struct CommandTrigger {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandTrigger {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child, on top of the inherited
    /// environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Trigger that re-runs the current executable with `args`.
    pub fn current_exe<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = std::env::current_exe().map_err(|source| PipelineError::Launch {
            program: "<current executable>".to_string(),
            source,
        })?;
        Ok(Self::new(program).args(args))
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

#[async_trait]
impl SweepTrigger for CommandTrigger {
    async fn trigger(&self) -> Result<SweepOutcome> {
        tracing::debug!(program = %self.program.display(), args = ?self.args, "Launching sweep");

        let status = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| PipelineError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if status.success() {
            Ok(SweepOutcome::Completed(None))
        } else {
            Ok(SweepOutcome::Failed(format!("sweep exited with {}", status)))
        }
    }
}
