// ABOUTME: Waits for a submitted deployment to reach a terminal status.
// ABOUTME: Resolves the job by correlation token, then polls by job name until done or timed out.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::types::JobName;

use super::command::CorrelationToken;
use super::engine::{CmEngine, EngineError, HistoryFilter, HistoryRecord};
use super::status::DeploymentStatus;

/// Interval between history queries when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Wait budget when the caller passes the `-1` sentinel.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors that end a wait.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timed out after {elapsed:?} waiting for deployment{}", describe_job(.job))]
    Timeout {
        elapsed: Duration,
        job: Option<JobName>,
        last_status: Option<DeploymentStatus>,
    },

    #[error("invalid timeout {0}ms: use -1 for the default or a non-negative value")]
    InvalidTimeout(i64),

    /// The history query failed in a way another attempt cannot fix.
    #[error("deployment history query failed: {0}")]
    Engine(#[source] EngineError),
}

fn describe_job(job: &Option<JobName>) -> String {
    match job {
        Some(job) => format!(" job {}", job),
        None => String::new(),
    }
}

/// How long a wait may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitTimeout {
    /// 24 hours.
    #[default]
    Default,
    Limit(Duration),
}

impl WaitTimeout {
    /// Interpret a caller-supplied millisecond value; `-1` selects the default.
    pub fn from_millis(millis: i64) -> Result<Self, WaitError> {
        match millis {
            -1 => Ok(WaitTimeout::Default),
            m if m < 0 => Err(WaitError::InvalidTimeout(m)),
            m => Ok(WaitTimeout::Limit(Duration::from_millis(m as u64))),
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            WaitTimeout::Default => DEFAULT_TIMEOUT,
            WaitTimeout::Limit(limit) => *limit,
        }
    }
}

/// How a wait ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    /// No history record carried the token: nothing was submitted.
    NoDeploymentFound,
    Finished {
        job: JobName,
        status: DeploymentStatus,
    },
}

impl DeploymentOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            DeploymentOutcome::NoDeploymentFound => 0,
            DeploymentOutcome::Finished { status, .. } => status.exit_code(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: WaitTimeout,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: WaitTimeout::Default,
        }
    }
}

/// Sequential poller over the engine's deployment history.
pub struct DeploymentPoller<'a, E: CmEngine + ?Sized> {
    engine: &'a E,
    settings: PollSettings,
}

struct Tracked {
    job: JobName,
    status: DeploymentStatus,
}

impl<'a, E: CmEngine + ?Sized> DeploymentPoller<'a, E> {
    pub fn new(engine: &'a E, settings: PollSettings) -> Self {
        Self { engine, settings }
    }

    /// Block until the deployment tagged with `token` on `entity` finishes.
    ///
    /// Transient query failures and unparseable statuses are logged and retried.
    /// An entity that does not exist yet has no deployment to wait for. Any other
    /// engine failure, or the deadline, ends the wait with an error.
    pub async fn wait(
        &self,
        entity: &str,
        token: &CorrelationToken,
    ) -> Result<DeploymentOutcome, WaitError> {
        let started = Instant::now();
        let deadline = self.settings.timeout.duration();
        let mut tracked: Option<Tracked> = None;
        let mut last_reported: Option<DeploymentStatus> = None;

        info!(entity, token = token.as_str(), "waiting for deployment");

        loop {
            if let Some(current) = tracked.as_mut() {
                let filter = HistoryFilter::job(entity, current.job.clone());
                match self.engine.history(&filter).await {
                    Ok(records) => match records.into_iter().find(|r| r.job_name == current.job) {
                        Some(record) => {
                            current.status = DeploymentStatus::classify(record.result.as_deref());
                        }
                        None => debug!(job = %current.job, "job not visible yet"),
                    },
                    Err(e) if e.is_transient() => {
                        warn!(job = %current.job, error = %e, "history query failed; retrying")
                    }
                    Err(e) => return Err(WaitError::Engine(e)),
                }
            } else {
                match self.engine.history(&HistoryFilter::entity(entity)).await {
                    Ok(records) => match find_tagged(records, token) {
                        Some(record) => {
                            info!(job = %record.job_name, "resolved deployment job");
                            tracked = Some(Tracked {
                                status: DeploymentStatus::classify(record.result.as_deref()),
                                job: record.job_name,
                            });
                        }
                        None => {
                            info!(entity, "no deployment found for token");
                            return Ok(DeploymentOutcome::NoDeploymentFound);
                        }
                    },
                    Err(e) if e.is_not_found() => {
                        info!(entity, error = %e, "entity has no deployment history");
                        return Ok(DeploymentOutcome::NoDeploymentFound);
                    }
                    Err(e) if e.is_transient() => {
                        warn!(entity, error = %e, "history query failed; retrying")
                    }
                    Err(e) => return Err(WaitError::Engine(e)),
                }
            }

            if let Some(current) = &tracked {
                report_change(&current.job, &current.status, &mut last_reported);
                if current.status.is_finished() {
                    return Ok(DeploymentOutcome::Finished {
                        job: current.job.clone(),
                        status: current.status.clone(),
                    });
                }
            }

            tokio::time::sleep(self.settings.interval).await;

            let elapsed = started.elapsed();
            if elapsed > deadline {
                return Err(WaitError::Timeout {
                    elapsed,
                    job: tracked.as_ref().map(|t| t.job.clone()),
                    last_status: tracked.map(|t| t.status),
                });
            }
        }
    }
}

fn find_tagged(records: Vec<HistoryRecord>, token: &CorrelationToken) -> Option<HistoryRecord> {
    records.into_iter().find(|r| token.matches(&r.comment))
}

fn report_change(job: &JobName, status: &DeploymentStatus, last: &mut Option<DeploymentStatus>) {
    if last.as_ref() == Some(status) {
        return;
    }
    match status {
        DeploymentStatus::Other(_) if status.is_finished() => {
            warn!(job = %job, status = %status, "unrecognized terminal status; treating as failure")
        }
        DeploymentStatus::Unparseable(_) | DeploymentStatus::Other(_) => {
            warn!(job = %job, status = %status, "unrecognized deployment status; still pending")
        }
        _ => info!(job = %job, status = %status, "deployment status changed"),
    }
    *last = Some(status.clone());
}
