use std::path::{Component, Path};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use evoforge_types::{CodeVariant, Codebase, Dimension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EvaluationError;
use crate::evaluator::Evaluator;

/// CPU and memory ceilings applied to an external tool process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub cpu_seconds: u64,
    pub memory_mb: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_seconds: 30,
            memory_mb: 1024,
        }
    }
}

/// Adapter for an external analysis tool.
///
/// Each call writes the variant's files into a fresh temporary directory and
/// runs `program args..` there in a child process with `ulimit` CPU and
/// virtual-memory ceilings, a cleared environment (only `PATH` is kept) and
/// no stdin. The tool reports its score as the last non-empty line of
/// stdout. The process is killed if the call is cancelled or the budget
/// expires.
#[derive(Clone, Debug)]
pub struct CommandEvaluator {
    dimension: Dimension,
    name: String,
    program: String,
    args: Vec<String>,
    limits: ResourceLimits,
}

impl CommandEvaluator {
    pub fn new(dimension: Dimension, program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            dimension,
            name: program.clone(),
            program,
            args: Vec::new(),
            limits: ResourceLimits::default(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    fn launcher_script(&self) -> String {
        format!(
            "ulimit -t {}; ulimit -v {}; exec \"$0\" \"$@\"",
            self.limits.cpu_seconds,
            self.limits.memory_mb.saturating_mul(1024)
        )
    }
}

/// Write every file of `codebase` under `root`. Absolute paths and paths
/// that climb out of `root` are rejected.
async fn materialize(root: &Path, codebase: &Codebase) -> Result<(), EvaluationError> {
    for (path, source) in codebase.files() {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(EvaluationError::crashed(format!(
                "refusing to materialize path {path:?}"
            )));
        }

        let target = root.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| EvaluationError::crashed(format!("creating {path}: {e}")))?;
        }
        tokio::fs::write(&target, source)
            .await
            .map_err(|e| EvaluationError::crashed(format!("writing {path}: {e}")))?;
    }
    Ok(())
}

fn parse_score(stdout: &[u8]) -> Option<f64> {
    String::from_utf8_lossy(stdout)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| line.trim().parse::<f64>().ok())
}

#[async_trait]
impl Evaluator for CommandEvaluator {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, variant: &CodeVariant, budget: Duration) -> Result<f64, EvaluationError> {
        let workdir = tempfile::tempdir()
            .map_err(|e| EvaluationError::crashed(format!("creating workdir: {e}")))?;
        materialize(workdir.path(), variant.codebase()).await?;

        let path = std::env::var_os("PATH").unwrap_or_else(|| "/usr/bin:/bin".into());
        let mut command = tokio::process::Command::new("sh");
        command
            .arg("-c")
            .arg(self.launcher_script())
            .arg(&self.program)
            .args(&self.args)
            .current_dir(workdir.path())
            .env_clear()
            .env("PATH", path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(tool = %self.name, variant = %variant.id(), "Launching evaluator process");
        let output = tokio::time::timeout(budget, command.output())
            .await
            .map_err(|_| EvaluationError::Timeout(budget.as_millis() as u64))?
            .map_err(|e| EvaluationError::crashed(format!("launching {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EvaluationError::crashed(format!(
                "{} exited with {}: {}",
                self.name,
                output.status,
                stderr.trim()
            )));
        }

        parse_score(&output.stdout).ok_or_else(|| {
            EvaluationError::crashed(format!("{} printed no numeric score", self.name))
        })
    }
}
