// ABOUTME: Engine-side commands: stage transitions, deployments, deliveries, and waits.
// ABOUTME: Each handler returns the process exit code on success.

use std::path::Path;

use stagegate::cm::{
    AreaFilter, AreaRollback, AreaScope, BaselineCreation, BaselineDeployment, CmEngine, Command,
    CorrelationToken, Delivery, DeploymentOutcome, DeploymentPoller, DeploymentSubmission,
    LifecycleAction, StageTransition, Upload, WorksetFilter, operations, parse_attributes,
};
use stagegate::config::Config;
use stagegate::error::{Error, Result};
use stagegate::output::Output;
use stagegate::types::{AreaType, ObjectSpec, StageId};

use crate::cli::{
    ActionArgs, CreateBaselineArgs, DeliverArgs, DeployArgs, RollbackAreaArgs, TransitionArgs,
    UploadArgs, WaitDeploymentArgs,
};

use super::connection::{connect_engine, load_config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Promote,
    Demote,
}

fn require<'a>(value: &'a str, name: &'static str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::MissingParameter(name));
    }
    Ok(value)
}

fn token(value: &str) -> Result<CorrelationToken> {
    Ok(CorrelationToken::new(require(value, "token")?))
}

/// Print a command for `--dry-run`, or submit it.
async fn dispatch<F, Fut>(
    command: Command,
    dry_run: bool,
    config_path: Option<&Path>,
    output: &Output,
    submit: F,
) -> Result<i32>
where
    F: FnOnce(Config) -> Fut,
    Fut: std::future::Future<Output = Result<String>>,
{
    if dry_run {
        output.data("", &[command.to_string()], &command.to_string());
        return Ok(0);
    }

    let config = load_config(config_path)?;
    output.progress(&format!("Executing: {}", command));
    let message = submit(config).await?;
    output.success(&message);
    Ok(0)
}

pub async fn transition(
    kind: TransitionKind,
    args: TransitionArgs,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<i32> {
    let product = require(&args.product, "product")?;
    let baseline = ObjectSpec::new(product, require(&args.baseline, "baseline")?)?;
    let workset = match args.project.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(project) => Some(ObjectSpec::new(product, project)?),
        None => None,
    };

    let transition = StageTransition {
        baseline,
        workset,
        stage: StageId::parse_optional(args.stage.as_deref()),
        deploy: args.deploy,
        areas: args.areas.as_deref().and_then(AreaFilter::parse),
        comment: args.comment,
        token: token(&args.token)?,
    };

    let command = match kind {
        TransitionKind::Promote => Command::promote(&transition),
        TransitionKind::Demote => Command::demote(&transition),
    };

    dispatch(command, args.dry_run, config_path, output, |config| async move {
        let engine = connect_engine(&config)?;
        let message = match kind {
            TransitionKind::Promote => operations::promote(&engine, &transition).await?,
            TransitionKind::Demote => operations::demote(&engine, &transition).await?,
        };
        Ok::<_, Error>(message)
    })
    .await
}

pub async fn deliver(
    args: DeliverArgs,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<i32> {
    let delivery = Delivery {
        directory: args.directory,
        workset: ObjectSpec::new(
            require(&args.product, "product")?,
            require(&args.project, "project")?,
        )?,
        add: args.add,
        update: args.update,
        delete: args.delete,
        attributes: args.attributes,
        comment: args.comment,
    };

    dispatch(
        Command::deliver(&delivery),
        args.dry_run,
        config_path,
        output,
        |config| async move {
            let engine = connect_engine(&config)?;
            Ok::<_, Error>(operations::deliver(&engine, &delivery).await?)
        },
    )
    .await
}

pub async fn upload(args: UploadArgs, config_path: Option<&Path>, output: &Output) -> Result<i32> {
    let upload = Upload {
        directory: args.directory,
        workset: ObjectSpec::new(
            require(&args.product, "product")?,
            require(&args.project, "project")?,
        )?,
        attributes: args.attributes,
        comment: args.comment,
        description: args.description,
    };

    dispatch(
        Command::upload(&upload),
        args.dry_run,
        config_path,
        output,
        |config| async move {
            let engine = connect_engine(&config)?;
            Ok::<_, Error>(operations::upload(&engine, &upload).await?)
        },
    )
    .await
}

pub async fn rollback_area(
    args: RollbackAreaArgs,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<i32> {
    let rollback = AreaRollback {
        area: require(&args.area, "area")?.to_string(),
        version: args.version,
        comment: args.comment,
    };

    dispatch(
        Command::rollback_area(&rollback),
        args.dry_run,
        config_path,
        output,
        |config| async move {
            let engine = connect_engine(&config)?;
            Ok::<_, Error>(operations::rollback_area(&engine, &rollback).await?)
        },
    )
    .await
}

pub async fn create_baseline(
    args: CreateBaselineArgs,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<i32> {
    let product = require(&args.product, "product")?;
    let attributes = parse_attributes(&args.attributes).map_err(|line| {
        Error::InvalidParameter("attributes", format!("expected NAME=value, got '{}'", line))
    })?;
    let creation = BaselineCreation {
        baseline: ObjectSpec::new(product, require(&args.baseline, "baseline")?)?,
        project: ObjectSpec::new(product, require(&args.project, "project")?)?,
        baseline_type: require(&args.baseline_type, "type")?.to_string(),
        attributes,
    };

    dispatch(
        Command::create_baseline(&creation),
        args.dry_run,
        config_path,
        output,
        |config| async move {
            let engine = connect_engine(&config)?;
            Ok::<_, Error>(operations::create_baseline(&engine, &creation).await?)
        },
    )
    .await
}

pub async fn action(args: ActionArgs, config_path: Option<&Path>, output: &Output) -> Result<i32> {
    let action = LifecycleAction {
        kind: args.kind,
        target: ObjectSpec::new(
            require(&args.product, "product")?,
            require(&args.name, "name")?,
        )?,
        state: require(&args.state, "state")?.to_string(),
        comment: args.comment,
    };

    dispatch(
        Command::action(&action),
        args.dry_run,
        config_path,
        output,
        |config| async move {
            let engine = connect_engine(&config)?;
            Ok::<_, Error>(operations::action(&engine, &action).await?)
        },
    )
    .await
}

pub async fn deploy(args: DeployArgs, config_path: Option<&Path>, output: &mut Output) -> Result<i32> {
    let config = load_config(config_path)?;
    let engine = connect_engine(&config)?;
    let product = require(&args.product, "product")?;

    let deployment = BaselineDeployment {
        baseline: ObjectSpec::new(product, require(&args.baseline, "baseline")?)?,
        project: ObjectSpec::new(product, require(&args.project, "project")?)?,
        areas: args.areas.as_deref().and_then(AreaFilter::parse),
        comment: args.comment,
        token: token(&args.token)?,
        lifecycle: args
            .lifecycle
            .unwrap_or_else(|| config.engine().map(|e| e.lifecycle.clone()).unwrap_or_default()),
    };

    output.start_timer();
    output.progress(&format!(
        "Deploying {} via {}",
        deployment.baseline, deployment.project
    ));

    match operations::deploy_baseline(&engine, &deployment).await? {
        DeploymentSubmission::NothingToDeploy => {
            output.success("No areas selected; nothing to deploy");
            Ok(0)
        }
        DeploymentSubmission::Submitted { message, areas } => {
            output.progress(&format!("  → Areas: {}", areas.join(", ")));
            output.progress(&format!("  → {}", message));
            if !args.wait {
                output.success("Deployment submitted");
                return Ok(0);
            }
            let entity = deployment.baseline.to_string();
            wait(&engine, &config, &entity, &deployment.token, args.timeout_ms, output).await
        }
    }
}

pub async fn wait_deployment(
    args: WaitDeploymentArgs,
    config_path: Option<&Path>,
    output: &mut Output,
) -> Result<i32> {
    let config = load_config(config_path)?;
    let engine = connect_engine(&config)?;
    let entity = require(&args.entity, "entity")?.to_uppercase();
    let token = token(&args.token)?;

    output.start_timer();
    wait(&engine, &config, &entity, &token, args.timeout_ms, output).await
}

async fn wait<E: CmEngine + ?Sized>(
    engine: &E,
    config: &Config,
    entity: &str,
    token: &CorrelationToken,
    timeout_ms: Option<i64>,
    output: &Output,
) -> Result<i32> {
    let settings = config.deployment.poll_settings(timeout_ms)?;
    output.progress(&format!("Waiting for deployment of {}...", entity));

    let outcome = DeploymentPoller::new(engine, settings)
        .wait(entity, token)
        .await?;

    match &outcome {
        DeploymentOutcome::NoDeploymentFound => {
            output.success("No deployment found; nothing was submitted")
        }
        DeploymentOutcome::Finished { job, status } if status.is_success() => {
            output.success(&format!("Deployment {} succeeded", job))
        }
        DeploymentOutcome::Finished { job, status } => {
            output.error(&format!("Deployment {} finished with status {}", job, status))
        }
    }

    Ok(outcome.exit_code())
}

pub async fn areas(
    product: Option<&str>,
    project: Option<&str>,
    stage: Option<&str>,
    types: Vec<AreaType>,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<i32> {
    let project = project.map(str::trim).filter(|p| !p.is_empty());
    let scope = match project {
        Some(project) => {
            let product = require(product.unwrap_or_default(), "product")?;
            AreaScope::Project(ObjectSpec::new(product, project)?)
        }
        None => AreaScope::Global(types),
    };
    let stage = StageId::parse_optional(stage);

    let config = load_config(config_path)?;
    let engine = connect_engine(&config)?;
    let areas = operations::list_areas(&engine, &scope, stage.as_ref()).await?;

    let title = match &scope {
        AreaScope::Project(project) => format!("File areas of {}:", project),
        AreaScope::Global(_) => "File areas:".to_string(),
    };
    let lines: Vec<String> = areas
        .iter()
        .map(|a| format!("{}\t{}", a.name, a.stage))
        .collect();
    output.data(&title, &lines, &areas);
    Ok(0)
}

pub async fn projects(
    product: &str,
    filter: WorksetFilter,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<i32> {
    let product = require(product, "product")?.to_uppercase();
    let config = load_config(config_path)?;
    let engine = connect_engine(&config)?;

    let names = operations::list_projects(&engine, &product, filter).await?;
    output.data(&format!("Worksets of {} ({}):", product, filter.as_str()), &names, &names);
    Ok(0)
}

pub async fn baselines(product: &str, config_path: Option<&Path>, output: &Output) -> Result<i32> {
    let product = require(product, "product")?.to_uppercase();
    let config = load_config(config_path)?;
    let engine = connect_engine(&config)?;

    let names = operations::list_baselines(&engine, &product).await?;
    output.data(&format!("Release baselines of {}:", product), &names, &names);
    Ok(0)
}

pub async fn stages(config_path: Option<&Path>, output: &Output) -> Result<i32> {
    let config = load_config(config_path)?;
    let engine = connect_engine(&config)?;

    let stages = engine.stages().await?;
    let lines: Vec<String> = stages.iter().map(|s| s.to_string()).collect();
    output.data("Stages:", &lines, &stages);
    Ok(0)
}
