// ABOUTME: One-shot notification of an approval outcome to the orchestrator.
// ABOUTME: PUT {base}/{execution}/{status} with basic auth and no body.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

use crate::types::ExecutionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallbackStatus {
    Completed,
    Failed,
}

impl CallbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackStatus::Completed => "COMPLETED",
            CallbackStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for CallbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("callback returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("callback transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid callback configuration: {0}")]
    Config(String),
}

/// Delivers approval outcomes. Callers never retry.
#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    async fn notify(
        &self,
        target: &CallbackTarget,
        execution: &ExecutionId,
        status: CallbackStatus,
    ) -> Result<(), CallbackError>;
}

/// Where and as whom to call back.
#[derive(Clone)]
pub struct CallbackTarget {
    base: String,
    username: String,
    password: String,
}

impl fmt::Debug for CallbackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTarget")
            .field("base", &self.base)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl CallbackTarget {
    /// The base is normalized to end with `/`.
    pub fn new(base: &str, username: &str, password: &str) -> Self {
        let base = base.trim();
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        Self {
            base,
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, execution: &ExecutionId, status: CallbackStatus) -> String {
        format!("{}{}/{}", self.base, execution, status)
    }
}

/// HTTP callback to the orchestrator. One instance can serve many targets.
#[derive(Debug, Clone)]
pub struct HttpCallback {
    http: reqwest::Client,
}

impl HttpCallback {
    pub fn new(timeout: Duration) -> Result<Self, CallbackError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stagegate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CallbackError::Config(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallback {
    async fn notify(
        &self,
        target: &CallbackTarget,
        execution: &ExecutionId,
        status: CallbackStatus,
    ) -> Result<(), CallbackError> {
        let url = target.url(execution, status);
        debug!(url = %url, "sending approval callback");

        let response = self
            .http
            .put(&url)
            .basic_auth(&target.username, Some(&target.password))
            .send()
            .await?;

        let code = response.status();
        if code != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CallbackError::Rejected {
                status: code.as_u16(),
                body,
            });
        }

        info!(execution = %execution, status = %status, "callback delivered");
        Ok(())
    }
}
