// ABOUTME: Scriptable CmEngine for integration tests.
// ABOUTME: History answers come from a queue; commands and deployments are recorded.

use std::collections::{HashMap, VecDeque};
use std::io;

use async_trait::async_trait;
use parking_lot::Mutex;
use stagegate::cm::{
    CmEngine, Command, DeploymentRequest, EngineError, HistoryFilter, HistoryRecord, ObjectKind,
    WorksetFilter,
};
use stagegate::types::{AreaType, FileArea, JobName, Lifecycle, ObjectSpec, StageId};

pub fn record(comment: &str, job: &str, result: Option<&str>) -> HistoryRecord {
    HistoryRecord {
        comment: comment.to_string(),
        job_name: JobName::new(job),
        result: result.map(str::to_string),
    }
}

/// One scripted answer to a history query.
#[derive(Debug, Clone)]
pub enum HistoryStep {
    Records(Vec<HistoryRecord>),
    /// Gateway ran and refused; worth retrying.
    Transient,
    /// The queried entity does not exist.
    NotFound,
    /// Gateway binary could not be started.
    MissingGateway,
    /// Gateway printed something that is not history JSON.
    Garbled,
}

impl HistoryStep {
    fn answer(self, entity: &str) -> Result<Vec<HistoryRecord>, EngineError> {
        match self {
            HistoryStep::Records(records) => Ok(records),
            HistoryStep::Transient => Err(EngineError::Rejected("gateway timeout".to_string())),
            HistoryStep::NotFound => Err(EngineError::not_found(ObjectKind::Baseline, entity)),
            HistoryStep::MissingGateway => Err(EngineError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "No such file or directory",
            ))),
            HistoryStep::Garbled => Err(EngineError::InvalidResponse(
                "expected value at line 1 column 1".to_string(),
            )),
        }
    }
}

/// Every field is public so tests can build one with struct-update syntax.
///
/// Each history call pops the next step; once the queue is empty the last step repeats.
/// Names in `projects`, `streams`, and `release_baselines` carry their `PRODUCT:` prefix.
#[derive(Default)]
pub struct ScriptedEngine {
    pub products: Vec<String>,
    pub stages: Vec<StageId>,
    pub lifecycles: HashMap<String, Lifecycle>,
    /// Baseline spec to its current stage; absent baselines are not found.
    pub baselines: HashMap<String, Option<StageId>>,
    /// Project spec to its areas; absent projects are not found.
    pub areas: HashMap<String, Vec<FileArea>>,
    pub typed_areas: Vec<(AreaType, FileArea)>,
    pub projects: Vec<String>,
    pub streams: Vec<String>,
    pub release_baselines: Vec<String>,
    /// Refuse every command and deployment with this message.
    pub reject: Option<String>,
    pub history: Mutex<VecDeque<HistoryStep>>,
    pub last_step: Mutex<Option<HistoryStep>>,
    pub history_calls: Mutex<Vec<HistoryFilter>>,
    pub commands: Mutex<Vec<String>>,
    pub deployments: Mutex<Vec<DeploymentRequest>>,
}

impl ScriptedEngine {
    pub fn with_history(self, steps: impl IntoIterator<Item = HistoryStep>) -> Self {
        self.history.lock().extend(steps);
        self
    }

    pub fn push_history(&self, step: HistoryStep) {
        self.history.lock().push_back(step);
    }

    pub fn push_records(&self, records: Vec<HistoryRecord>) {
        self.push_history(HistoryStep::Records(records));
    }

    pub fn history_calls(&self) -> Vec<HistoryFilter> {
        self.history_calls.lock().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    pub fn deployments(&self) -> Vec<DeploymentRequest> {
        self.deployments.lock().clone()
    }

    fn refuse(&self) -> Result<(), EngineError> {
        match &self.reject {
            Some(reason) => Err(EngineError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CmEngine for ScriptedEngine {
    async fn run_command(&self, command: &Command) -> Result<String, EngineError> {
        self.refuse()?;
        self.commands.lock().push(command.to_string());
        Ok("Operation completed".to_string())
    }

    async fn deploy(&self, request: &DeploymentRequest) -> Result<String, EngineError> {
        self.refuse()?;
        self.deployments.lock().push(request.clone());
        Ok("Deployment submitted".to_string())
    }

    async fn history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, EngineError> {
        self.history_calls.lock().push(filter.clone());

        let next = self.history.lock().pop_front();
        let step = match next {
            Some(step) => {
                *self.last_step.lock() = Some(step.clone());
                step
            }
            None => self
                .last_step
                .lock()
                .clone()
                .unwrap_or(HistoryStep::Records(Vec::new())),
        };
        step.answer(&filter.entity)
    }

    async fn products(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.products.clone())
    }

    async fn stages(&self) -> Result<Vec<StageId>, EngineError> {
        Ok(self.stages.clone())
    }

    async fn lifecycle(&self, name: &str) -> Result<Lifecycle, EngineError> {
        self.lifecycles
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::not_found(ObjectKind::Lifecycle, name))
    }

    async fn baseline_stage(&self, baseline: &ObjectSpec) -> Result<Option<StageId>, EngineError> {
        self.baselines
            .get(&baseline.to_string())
            .cloned()
            .ok_or_else(|| EngineError::not_found(ObjectKind::Baseline, baseline.to_string()))
    }

    async fn areas(&self, project: &ObjectSpec) -> Result<Vec<FileArea>, EngineError> {
        self.areas
            .get(&project.to_string())
            .cloned()
            .ok_or_else(|| EngineError::not_found(ObjectKind::Project, project.to_string()))
    }

    async fn areas_by_type(&self, types: &[AreaType]) -> Result<Vec<FileArea>, EngineError> {
        Ok(self
            .typed_areas
            .iter()
            .filter(|(kind, _)| types.is_empty() || types.contains(kind))
            .map(|(_, area)| area.clone())
            .collect())
    }

    async fn projects(
        &self,
        _product: &str,
        filter: WorksetFilter,
    ) -> Result<Vec<String>, EngineError> {
        let mut names = Vec::new();
        if filter != WorksetFilter::Streams {
            names.extend(self.projects.iter().cloned());
        }
        if filter != WorksetFilter::Projects {
            names.extend(self.streams.iter().cloned());
        }
        Ok(names)
    }

    async fn baselines(&self, _product: &str) -> Result<Vec<String>, EngineError> {
        Ok(self.release_baselines.clone())
    }
}
