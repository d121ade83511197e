// ABOUTME: Classification of raw deployment result codes.
// ABOUTME: Maps engine status strings to lifecycle states and a finished/pending judgement.

use std::fmt;

/// Lifecycle state of a deployment job as reported in its history record.
///
/// Codes: 0 = Submitted, 1 = Executing, 2 = Succeeded, 3 = Failed.
/// Any code >= 2 is terminal; only 2 is a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    Submitted,
    Executing,
    Succeeded,
    Failed,
    /// Numeric code outside the known set.
    Other(i64),
    /// Missing or non-numeric result; always treated as still pending.
    Unparseable(String),
}

impl DeploymentStatus {
    /// Classify a raw result value. Never fails.
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return DeploymentStatus::Unparseable(String::new());
        };

        match raw.parse::<i64>() {
            Ok(0) => DeploymentStatus::Submitted,
            Ok(1) => DeploymentStatus::Executing,
            Ok(2) => DeploymentStatus::Succeeded,
            Ok(3) => DeploymentStatus::Failed,
            Ok(code) => DeploymentStatus::Other(code),
            Err(_) => DeploymentStatus::Unparseable(raw.to_string()),
        }
    }

    /// Whether the job reached a terminal state (successfully or not).
    pub fn is_finished(&self) -> bool {
        match self {
            DeploymentStatus::Succeeded | DeploymentStatus::Failed => true,
            DeploymentStatus::Other(code) => *code >= 2,
            _ => false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeploymentStatus::Succeeded)
    }

    /// Exit code reported to the invoking step: 0 for success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentStatus::Submitted => write!(f, "Submitted"),
            DeploymentStatus::Executing => write!(f, "Executing"),
            DeploymentStatus::Succeeded => write!(f, "Succeeded"),
            DeploymentStatus::Failed => write!(f, "Failed"),
            DeploymentStatus::Other(code) => write!(f, "Unknown ({})", code),
            DeploymentStatus::Unparseable(raw) => write!(f, "Unrecognized ({:?})", raw),
        }
    }
}
