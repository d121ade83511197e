// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use stagegate::cm::{EntityKind, WorksetFilter};
use stagegate::types::AreaType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stagegate")]
#[command(about = "Approval-gated baseline promotion and deployment bridge")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: discover stagegate.yml in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// JSON lines output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Promote a baseline to the next (or a given) stage
    Promote(TransitionArgs),

    /// Demote a baseline to the previous (or a given) stage
    Demote(TransitionArgs),

    /// Deploy a baseline to the file areas at its current stage
    Deploy(DeployArgs),

    /// Deliver a local directory into a project or stream
    Deliver(DeliverArgs),

    /// Upload a local directory into a project, keeping permissions
    Upload(UploadArgs),

    /// Roll a file area back to a previous version
    RollbackArea(RollbackAreaArgs),

    /// Create a baseline from the current content of a project
    CreateBaseline(CreateBaselineArgs),

    /// Move a baseline, project, or stream to another lifecycle state
    Action(ActionArgs),

    /// List the file areas of a project, or all areas of the given types
    Areas {
        /// Required with --project
        #[arg(long)]
        product: Option<String>,

        #[arg(long, requires = "product")]
        project: Option<String>,

        /// Only areas at this stage
        #[arg(long)]
        stage: Option<String>,

        /// Area types to list when no project is given (default: all)
        #[arg(long = "type", value_enum, conflicts_with = "project")]
        types: Vec<AreaTypeArg>,
    },

    /// List the projects and streams of a product
    Projects {
        #[arg(long)]
        product: String,

        #[arg(long, value_enum, default_value_t = WorksetArg::All)]
        only: WorksetArg,
    },

    /// List the release baselines of a product
    Baselines {
        #[arg(long)]
        product: String,
    },

    /// List lifecycle stages known to the engine
    Stages,

    /// Block until a submitted deployment finishes (exit 0 success, 1 failure)
    WaitDeployment(WaitDeploymentArgs),

    /// Inspect and update ITSM change records
    #[command(subcommand)]
    Change(ChangeCommands),

    /// Wait for a change to be approved and notify the orchestrator
    WaitApproval(WaitApprovalArgs),
}

#[derive(Args)]
pub struct TransitionArgs {
    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub baseline: String,

    /// Project or stream providing the areas
    #[arg(long)]
    pub project: Option<String>,

    /// Target stage
    #[arg(long)]
    pub stage: Option<String>,

    /// Deploy after the stage change
    #[arg(long)]
    pub deploy: bool,

    /// Areas to deploy to (`;` or newline separated, or ALL)
    #[arg(long)]
    pub areas: Option<String>,

    #[arg(long, default_value = "")]
    pub comment: String,

    /// Correlation token appended to the comment
    #[arg(long)]
    pub token: String,

    /// Print the command without submitting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CreateBaselineArgs {
    #[arg(long)]
    pub product: String,

    /// Project the baseline is taken from
    #[arg(long)]
    pub project: String,

    #[arg(long)]
    pub baseline: String,

    /// Baseline type defined in the product's process model
    #[arg(long = "type")]
    pub baseline_type: String,

    /// Attributes, one `NAME=value` per line
    #[arg(long, default_value = "")]
    pub attributes: String,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ActionArgs {
    #[arg(long)]
    pub product: String,

    /// baseline, project, or stream
    #[arg(long = "type")]
    pub kind: EntityKind,

    #[arg(long)]
    pub name: String,

    /// Target lifecycle state
    #[arg(long)]
    pub state: String,

    #[arg(long, default_value = "")]
    pub comment: String,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AreaTypeArg {
    Deployment,
    Work,
    LibraryCache,
}

impl From<AreaTypeArg> for AreaType {
    fn from(arg: AreaTypeArg) -> Self {
        match arg {
            AreaTypeArg::Deployment => AreaType::Deployment,
            AreaTypeArg::Work => AreaType::Work,
            AreaTypeArg::LibraryCache => AreaType::LibraryCache,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WorksetArg {
    All,
    Projects,
    Streams,
}

impl From<WorksetArg> for WorksetFilter {
    fn from(arg: WorksetArg) -> Self {
        match arg {
            WorksetArg::All => WorksetFilter::All,
            WorksetArg::Projects => WorksetFilter::Projects,
            WorksetArg::Streams => WorksetFilter::Streams,
        }
    }
}

#[derive(Args)]
pub struct DeployArgs {
    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub baseline: String,

    #[arg(long)]
    pub project: String,

    /// Areas to deploy to (`;` or newline separated, or ALL)
    #[arg(long)]
    pub areas: Option<String>,

    #[arg(long, default_value = "")]
    pub comment: String,

    /// Correlation token appended to the comment
    #[arg(long)]
    pub token: String,

    /// Lifecycle used when the baseline has no stage (default: from config)
    #[arg(long)]
    pub lifecycle: Option<String>,

    /// Wait for the deployment to finish
    #[arg(long)]
    pub wait: bool,

    /// Wait timeout in milliseconds; -1 selects 24 hours
    #[arg(long, allow_hyphen_values = true)]
    pub timeout_ms: Option<i64>,
}

#[derive(Args)]
pub struct DeliverArgs {
    #[arg(long)]
    pub directory: PathBuf,

    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub project: String,

    /// Add new files
    #[arg(long)]
    pub add: bool,

    /// Update changed files
    #[arg(long)]
    pub update: bool,

    /// Delete removed files
    #[arg(long)]
    pub delete: bool,

    /// Attributes (`NAME=value`, `;` or newline separated)
    #[arg(long, default_value = "")]
    pub attributes: String,

    #[arg(long, default_value = "")]
    pub comment: String,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct UploadArgs {
    #[arg(long)]
    pub directory: PathBuf,

    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub project: String,

    #[arg(long, default_value = "")]
    pub attributes: String,

    #[arg(long, default_value = "")]
    pub comment: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct RollbackAreaArgs {
    #[arg(long)]
    pub area: String,

    /// Version to restore (default: previous)
    #[arg(long)]
    pub version: Option<u32>,

    #[arg(long, default_value = "")]
    pub comment: String,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct WaitDeploymentArgs {
    /// Entity the deployment was submitted for (e.g. PRODUCT:BASELINE)
    #[arg(long)]
    pub entity: String,

    #[arg(long)]
    pub token: String,

    /// Timeout in milliseconds; -1 selects 24 hours
    #[arg(long, allow_hyphen_values = true)]
    pub timeout_ms: Option<i64>,
}

#[derive(Subcommand)]
pub enum ChangeCommands {
    /// Fetch one record by sys_id or number
    Get {
        /// change_request, change_task, or incident
        #[arg(long, default_value = "change_request")]
        table: String,

        #[arg(long, conflicts_with = "number", required_unless_present = "number")]
        id: Option<String>,

        #[arg(long)]
        number: Option<String>,
    },

    /// List records
    List {
        #[arg(long, default_value = "change_request")]
        table: String,

        /// Encoded query
        #[arg(long, default_value = "")]
        query: String,

        #[arg(long)]
        state: Option<String>,

        #[arg(long, default_value_t = 100)]
        limit: u32,

        /// Parent change request number (change_task only)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Create a change request
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long = "type", default_value = "normal")]
        kind: String,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long, default_value = "")]
        priority: String,

        #[arg(long, default_value = "")]
        risk: String,

        #[arg(long, default_value = "")]
        impact: String,
    },

    /// Create a change task under a change request
    CreateTask {
        /// sys_id of the parent change request
        #[arg(long)]
        change_request: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        urgency: String,

        #[arg(long, default_value = "")]
        priority: String,
    },

    /// Set the state of a change request or task
    SetState {
        #[arg(long, default_value = "change_request")]
        kind: String,

        #[arg(long)]
        id: String,

        #[arg(long)]
        state: String,
    },

    /// Set the approval of a change request
    SetApproval {
        #[arg(long)]
        id: String,

        #[arg(long)]
        approval: String,
    },
}

#[derive(Args)]
pub struct WaitApprovalArgs {
    /// change_request or change_task
    #[arg(long, default_value = "change_request")]
    pub kind: String,

    /// Orchestrator execution id (the change's sys_id)
    #[arg(long)]
    pub execution_id: String,

    /// Override approval.poll_interval, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Override approval.max_polls
    #[arg(long)]
    pub max_polls: Option<u32>,
}
