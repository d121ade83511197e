// ABOUTME: File areas and deployment lifecycles as seen by the engine.
// ABOUTME: Snapshots fetched per call; nothing here is cached.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StageId;

/// A physical grouping of deployable artifacts, tagged with a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileArea {
    pub name: String,
    pub stage: StageId,
}

impl FileArea {
    pub fn new(name: &str, stage: &str) -> Self {
        Self {
            name: name.to_string(),
            stage: StageId::new(stage),
        }
    }
}

/// Category of a file area, used when listing areas without a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaType {
    Deployment,
    Work,
    LibraryCache,
}

impl AreaType {
    /// Engine type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaType::Deployment => "DEPLOYMENT",
            AreaType::Work => "WORK",
            AreaType::LibraryCache => "LIBRARY CACHE",
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered stage list, earliest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lifecycle {
    stages: Vec<StageId>,
}

impl Lifecycle {
    pub fn new(stages: Vec<StageId>) -> Self {
        Self { stages }
    }

    /// Position of `stage` in the lifecycle, or -1 when the stage is not part of it.
    ///
    /// The -1 sentinel sorts before every real position; area selection relies on it.
    pub fn index_of(&self, stage: &StageId) -> i64 {
        self.stages
            .iter()
            .position(|s| s == stage)
            .map(|i| i as i64)
            .unwrap_or(-1)
    }

    /// Stage at a position returned by [`Lifecycle::index_of`].
    pub fn stage_at(&self, index: i64) -> Option<&StageId> {
        usize::try_from(index).ok().and_then(|i| self.stages.get(i))
    }

    pub fn stages(&self) -> &[StageId] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl FromIterator<StageId> for Lifecycle {
    fn from_iter<I: IntoIterator<Item = StageId>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
