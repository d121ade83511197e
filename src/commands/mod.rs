// ABOUTME: Command module aggregator for the stagegate CLI.
// ABOUTME: Re-exports engine-side and ITSM-side command handlers.

mod baseline;
mod change;
mod connection;

pub use baseline::{
    TransitionKind, action, areas, baselines, create_baseline, deliver, deploy, projects,
    rollback_area, stages, transition, upload, wait_deployment,
};
pub use change::{change, wait_approval};
