// ABOUTME: Engine collaborator backed by an external gateway program.
// ABOUTME: Each call spawns the gateway with a subcommand and parses its JSON output.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::process::Command as Process;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

use crate::types::{AreaType, FileArea, Lifecycle, ObjectSpec, StageId};

use super::command::Command;
use super::engine::{
    CmEngine, DeploymentRequest, EngineError, HistoryFilter, HistoryRecord, ObjectKind,
    WorksetFilter,
};

/// Gateway exit status meaning "object not found".
pub const EXIT_NOT_FOUND: i32 = 4;

/// Talks to the engine through `<program> <args..> <subcommand> ...`.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
    slots: Arc<Semaphore>,
}

/// A held engine connection. Released when dropped, on every exit path.
struct ConnectionSlot<'a> {
    _permit: SemaphorePermit<'a>,
}

impl Drop for ConnectionSlot<'_> {
    fn drop(&mut self) {
        debug!("released engine connection");
    }
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, max_connections: usize) -> Self {
        Self {
            program: program.into(),
            args,
            slots: Arc::new(Semaphore::new(max_connections.max(1))),
        }
    }

    /// Connections not currently held by a call.
    pub fn available_connections(&self) -> usize {
        self.slots.available_permits()
    }

    async fn connect(&self) -> Result<ConnectionSlot<'_>, EngineError> {
        let permit = self
            .slots
            .acquire()
            .await
            .map_err(|_| EngineError::Rejected("engine connection pool closed".to_string()))?;
        debug!("acquired engine connection");
        Ok(ConnectionSlot { _permit: permit })
    }

    /// Run the gateway and return stdout. `kind`/`subject` name the object for a not-found exit.
    async fn invoke(
        &self,
        kind: ObjectKind,
        subject: &str,
        args: &[String],
    ) -> Result<String, EngineError> {
        let _slot = self.connect().await?;

        debug!(program = %self.program.display(), subcommand = ?args.first(), "invoking engine gateway");

        let output = Process::new(&self.program)
            .args(&self.args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        match output.status.code() {
            Some(0) => Ok(stdout),
            Some(EXIT_NOT_FOUND) => Err(EngineError::not_found(kind, subject)),
            code => {
                let reason = if stderr.is_empty() {
                    match code {
                        Some(code) => format!("gateway exited with status {}", code),
                        None => "gateway terminated by signal".to_string(),
                    }
                } else {
                    stderr
                };
                Err(EngineError::Rejected(reason))
            }
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        kind: ObjectKind,
        subject: &str,
        args: &[String],
    ) -> Result<T, EngineError> {
        let stdout = self.invoke(kind, subject, args).await?;
        serde_json::from_str(&stdout).map_err(|e| EngineError::InvalidResponse(e.to_string()))
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[async_trait]
impl CmEngine for ProcessEngine {
    async fn run_command(&self, command: &Command) -> Result<String, EngineError> {
        self.invoke(
            ObjectKind::Object,
            command.as_str(),
            &args(["run", command.as_str()]),
        )
        .await
    }

    async fn deploy(&self, request: &DeploymentRequest) -> Result<String, EngineError> {
        let baseline = request.baseline.to_string();
        let project = request.project.to_string();
        let mut argv = args([
            "deploy",
            "--baseline",
            &baseline,
            "--project",
            &project,
            "--comment",
            &request.comment,
        ]);
        for area in &request.areas {
            argv.push("--area".to_string());
            argv.push(area.clone());
        }
        self.invoke(ObjectKind::Baseline, &baseline, &argv).await
    }

    async fn history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, EngineError> {
        let mut argv = args(["history", "--entity", &filter.entity]);
        if let Some(job) = &filter.job {
            argv.push("--job".to_string());
            argv.push(job.to_string());
        }
        self.query(ObjectKind::Object, &filter.entity, &argv).await
    }

    async fn products(&self) -> Result<Vec<String>, EngineError> {
        self.query(ObjectKind::Product, "*", &args(["products"])).await
    }

    async fn stages(&self) -> Result<Vec<StageId>, EngineError> {
        self.query(ObjectKind::Stage, "*", &args(["stages"])).await
    }

    async fn lifecycle(&self, name: &str) -> Result<Lifecycle, EngineError> {
        let stages: Vec<StageId> = self
            .query(ObjectKind::Lifecycle, name, &args(["lifecycle", name]))
            .await?;
        Ok(Lifecycle::new(stages))
    }

    async fn baseline_stage(&self, baseline: &ObjectSpec) -> Result<Option<StageId>, EngineError> {
        let spec = baseline.to_string();
        let stage: Option<String> = self
            .query(ObjectKind::Baseline, &spec, &args(["baseline-stage", &spec]))
            .await?;
        Ok(StageId::parse_optional(stage.as_deref()))
    }

    async fn areas(&self, project: &ObjectSpec) -> Result<Vec<FileArea>, EngineError> {
        let spec = project.to_string();
        self.query(ObjectKind::Project, &spec, &args(["areas", &spec]))
            .await
    }

    async fn areas_by_type(&self, types: &[AreaType]) -> Result<Vec<FileArea>, EngineError> {
        let mut argv = args(["file-areas"]);
        for area_type in types {
            argv.push("--type".to_string());
            argv.push(area_type.as_str().to_string());
        }
        self.query(ObjectKind::Area, "*", &argv).await
    }

    async fn projects(
        &self,
        product: &str,
        filter: WorksetFilter,
    ) -> Result<Vec<String>, EngineError> {
        let mut argv = args(["projects", product]);
        match filter {
            WorksetFilter::All => {}
            WorksetFilter::Projects => argv.push("--projects".to_string()),
            WorksetFilter::Streams => argv.push("--streams".to_string()),
        }
        self.query(ObjectKind::Product, product, &argv).await
    }

    async fn baselines(&self, product: &str) -> Result<Vec<String>, EngineError> {
        self.query(ObjectKind::Product, product, &args(["baselines", product]))
            .await
    }
}
