// ABOUTME: Configuration-engine collaborator trait and its data records.
// ABOUTME: Submission, deployment history, and lifecycle/area lookups.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{AreaType, FileArea, JobName, Lifecycle, ObjectSpec, StageId};

use super::command::Command;

/// Operations the bridge needs from the configuration engine.
#[async_trait]
pub trait CmEngine: Send + Sync {
    /// Submit a rendered command. Returns the engine's message on acceptance.
    async fn run_command(&self, command: &Command) -> Result<String, EngineError>;

    /// Submit a deployment of a baseline to the given areas.
    async fn deploy(&self, request: &DeploymentRequest) -> Result<String, EngineError>;

    /// Deployment history, in no particular order.
    async fn history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, EngineError>;

    async fn products(&self) -> Result<Vec<String>, EngineError>;

    async fn stages(&self) -> Result<Vec<StageId>, EngineError>;

    async fn lifecycle(&self, name: &str) -> Result<Lifecycle, EngineError>;

    /// Current stage of a baseline; `None` when it was never staged.
    async fn baseline_stage(&self, baseline: &ObjectSpec) -> Result<Option<StageId>, EngineError>;

    /// File areas attached to a project.
    async fn areas(&self, project: &ObjectSpec) -> Result<Vec<FileArea>, EngineError>;

    /// File areas across the whole database, limited to `types` unless it is empty.
    async fn areas_by_type(&self, types: &[AreaType]) -> Result<Vec<FileArea>, EngineError>;

    /// Names of a product's projects and/or streams, as `PRODUCT:NAME` or bare names.
    async fn projects(
        &self,
        product: &str,
        filter: WorksetFilter,
    ) -> Result<Vec<String>, EngineError>;

    /// Names of a product's release baselines, as `PRODUCT:NAME` or bare names.
    async fn baselines(&self, product: &str) -> Result<Vec<String>, EngineError>;
}

/// Which worksets a project listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorksetFilter {
    #[default]
    All,
    Projects,
    Streams,
}

impl WorksetFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorksetFilter::All => "all",
            WorksetFilter::Projects => "projects",
            WorksetFilter::Streams => "streams",
        }
    }
}

/// One row of deployment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub comment: String,
    pub job_name: JobName,
    #[serde(default)]
    pub result: Option<String>,
}

/// History query: by entity, optionally narrowed to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    pub entity: String,
    pub job: Option<JobName>,
}

impl HistoryFilter {
    pub fn entity(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            job: None,
        }
    }

    pub fn job(entity: impl Into<String>, job: JobName) -> Self {
        Self {
            entity: entity.into(),
            job: Some(job),
        }
    }
}

/// Deployment submission. `comment` already carries the correlation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub baseline: ObjectSpec,
    pub project: ObjectSpec,
    pub comment: String,
    pub areas: Vec<String>,
}

/// Kinds of engine objects a lookup can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Product,
    Project,
    Baseline,
    Stage,
    Area,
    Lifecycle,
    Object,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Product => "product",
            ObjectKind::Project => "project",
            ObjectKind::Baseline => "baseline",
            ObjectKind::Stage => "stage",
            ObjectKind::Area => "area",
            ObjectKind::Lifecycle => "lifecycle",
            ObjectKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Errors from configuration-engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: ObjectKind, name: String },

    #[error("engine rejected request: {0}")]
    Rejected(String),

    #[error("failed to reach engine gateway: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid engine response: {0}")]
    InvalidResponse(String),
}

impl EngineError {
    pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Missing objects are caller mistakes, not engine failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }

    /// Whether asking again may succeed. Only a gateway that ran and refused
    /// qualifies; a missing gateway, garbage output, or a missing object do not.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Rejected(_))
    }
}
