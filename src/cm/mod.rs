// ABOUTME: Bridge to the configuration engine: commands, area selection, and deployment waits.
// ABOUTME: The engine itself sits behind the CmEngine trait.

pub mod areas;
pub mod command;
pub mod engine;
pub mod operations;
pub mod poller;
pub mod process;
pub mod status;

pub use areas::{AreaFilter, select};
pub use command::{
    AreaRollback, BaselineCreation, Command, CommandBuilder, CorrelationToken, Delivery,
    EntityKind, LifecycleAction, StageTransition, Upload, Verb, parse_attributes,
};
pub use engine::{
    CmEngine, DeploymentRequest, EngineError, HistoryFilter, HistoryRecord, ObjectKind,
    WorksetFilter,
};
pub use operations::{AreaScope, BaselineDeployment, DEFAULT_LIFECYCLE, DeploymentSubmission};
pub use poller::{DeploymentOutcome, DeploymentPoller, PollSettings, WaitError, WaitTimeout};
pub use process::ProcessEngine;
pub use status::DeploymentStatus;
