// ABOUTME: Orchestration steps against the configuration engine.
// ABOUTME: Validates inputs, renders commands or deployments, and submits them once.

use tracing::info;

use crate::types::{AreaType, FileArea, ObjectSpec, StageId};

use super::areas::{self, AreaFilter};
use super::command::{
    AreaRollback, BaselineCreation, Command, CorrelationToken, Delivery, LifecycleAction,
    StageTransition, Upload,
};
use super::engine::{CmEngine, DeploymentRequest, EngineError, ObjectKind, WorksetFilter};

/// Lifecycle consulted when a baseline has never been staged.
pub const DEFAULT_LIFECYCLE: &str = "LC_DM_STAGE";

/// Submit a promotion. Failures propagate without retry.
pub async fn promote<E: CmEngine + ?Sized>(
    engine: &E,
    transition: &StageTransition,
) -> Result<String, EngineError> {
    info!(
        baseline = %transition.baseline,
        stage = transition.stage.as_ref().map(StageId::as_str),
        "promoting baseline"
    );
    submit(engine, &Command::promote(transition)).await
}

/// Submit a demotion.
pub async fn demote<E: CmEngine + ?Sized>(
    engine: &E,
    transition: &StageTransition,
) -> Result<String, EngineError> {
    info!(
        baseline = %transition.baseline,
        stage = transition.stage.as_ref().map(StageId::as_str),
        "demoting baseline"
    );
    submit(engine, &Command::demote(transition)).await
}

pub async fn deliver<E: CmEngine + ?Sized>(
    engine: &E,
    delivery: &Delivery,
) -> Result<String, EngineError> {
    submit(engine, &Command::deliver(delivery)).await
}

pub async fn upload<E: CmEngine + ?Sized>(
    engine: &E,
    upload: &Upload,
) -> Result<String, EngineError> {
    submit(engine, &Command::upload(upload)).await
}

pub async fn rollback_area<E: CmEngine + ?Sized>(
    engine: &E,
    rollback: &AreaRollback,
) -> Result<String, EngineError> {
    submit(engine, &Command::rollback_area(rollback)).await
}

async fn submit<E: CmEngine + ?Sized>(engine: &E, command: &Command) -> Result<String, EngineError> {
    info!(command = %command, "executing");
    let message = engine.run_command(command).await?;
    info!(verb = %command.verb(), "engine accepted command");
    Ok(message)
}

/// A deployment of a baseline's content to a project's file areas.
#[derive(Debug, Clone)]
pub struct BaselineDeployment {
    pub baseline: ObjectSpec,
    pub project: ObjectSpec,
    pub areas: Option<AreaFilter>,
    pub comment: String,
    pub token: CorrelationToken,
    pub lifecycle: String,
}

/// Result of [`deploy_baseline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentSubmission {
    Submitted { message: String, areas: Vec<String> },
    /// Area selection came back empty; nothing was sent to the engine.
    NothingToDeploy,
}

/// Select areas for the baseline's current stage and submit the deployment.
pub async fn deploy_baseline<E: CmEngine + ?Sized>(
    engine: &E,
    deployment: &BaselineDeployment,
) -> Result<DeploymentSubmission, EngineError> {
    require_product(engine, deployment.baseline.product()).await?;

    let stage = engine.baseline_stage(&deployment.baseline).await?;
    let project_areas = engine.areas(&deployment.project).await?;
    info!(
        baseline = %deployment.baseline,
        stage = stage.as_ref().map(StageId::as_str),
        "resolved baseline stage"
    );

    let lifecycle = match stage {
        Some(_) => Default::default(),
        None => engine.lifecycle(&deployment.lifecycle).await?,
    };

    let selected = areas::select(
        &project_areas,
        stage.as_ref(),
        &lifecycle,
        deployment.areas.as_ref(),
    );

    if selected.is_empty() {
        info!(baseline = %deployment.baseline, "no areas selected; nothing to deploy");
        return Ok(DeploymentSubmission::NothingToDeploy);
    }

    let names: Vec<String> = selected.into_iter().map(|a| a.name).collect();
    info!(areas = ?names, "deploying");

    let request = DeploymentRequest {
        baseline: deployment.baseline.clone(),
        project: deployment.project.clone(),
        comment: deployment.token.tag(&deployment.comment),
        areas: names.clone(),
    };
    let message = engine.deploy(&request).await?;

    Ok(DeploymentSubmission::Submitted {
        message,
        areas: names,
    })
}

/// Create a baseline from a project. The product must exist.
pub async fn create_baseline<E: CmEngine + ?Sized>(
    engine: &E,
    creation: &BaselineCreation,
) -> Result<String, EngineError> {
    require_product(engine, creation.baseline.product()).await?;
    info!(
        baseline = %creation.baseline,
        project = %creation.project,
        kind = %creation.baseline_type,
        "creating baseline"
    );
    submit(engine, &Command::create_baseline(creation)).await
}

/// Move an object to another lifecycle state. The product must exist.
pub async fn action<E: CmEngine + ?Sized>(
    engine: &E,
    action: &LifecycleAction,
) -> Result<String, EngineError> {
    require_product(engine, action.target.product()).await?;
    info!(
        kind = %action.kind,
        target = %action.target,
        state = %action.state,
        "actioning"
    );
    submit(engine, &Command::action(action)).await
}

async fn require_product<E: CmEngine + ?Sized>(engine: &E, product: &str) -> Result<(), EngineError> {
    let products = engine.products().await?;
    if products.iter().any(|p| p.eq_ignore_ascii_case(product)) {
        Ok(())
    } else {
        Err(EngineError::not_found(ObjectKind::Product, product))
    }
}

/// `PRODUCT:NAME` becomes `NAME`; names from other products are left alone.
fn strip_product(product: &str, name: &str) -> String {
    match name.split_once(':') {
        Some((prefix, rest)) if prefix.eq_ignore_ascii_case(product) => rest.to_string(),
        _ => name.to_string(),
    }
}

/// Projects and/or streams of a product, without the product prefix.
pub async fn list_projects<E: CmEngine + ?Sized>(
    engine: &E,
    product: &str,
    filter: WorksetFilter,
) -> Result<Vec<String>, EngineError> {
    require_product(engine, product).await?;
    let names = engine.projects(product, filter).await?;
    Ok(names.iter().map(|n| strip_product(product, n)).collect())
}

/// Release baselines of a product, without the product prefix.
pub async fn list_baselines<E: CmEngine + ?Sized>(
    engine: &E,
    product: &str,
) -> Result<Vec<String>, EngineError> {
    require_product(engine, product).await?;
    let names = engine.baselines(product).await?;
    Ok(names.iter().map(|n| strip_product(product, n)).collect())
}

/// Where [`list_areas`] looks for areas.
#[derive(Debug, Clone)]
pub enum AreaScope {
    Project(ObjectSpec),
    /// Every area of these types; all types when empty.
    Global(Vec<AreaType>),
}

/// Areas in `scope`, optionally only those at `stage`. The stage must exist.
pub async fn list_areas<E: CmEngine + ?Sized>(
    engine: &E,
    scope: &AreaScope,
    stage: Option<&StageId>,
) -> Result<Vec<FileArea>, EngineError> {
    let areas = match scope {
        AreaScope::Project(project) => engine.areas(project).await?,
        AreaScope::Global(types) => engine.areas_by_type(types).await?,
    };

    let Some(stage) = stage else {
        return Ok(areas);
    };

    if !engine.stages().await?.contains(stage) {
        return Err(EngineError::not_found(ObjectKind::Stage, stage.as_str()));
    }

    Ok(areas.into_iter().filter(|a| a.stage == *stage).collect())
}
