// ABOUTME: ITSM-side commands: change record queries and updates, and approval waits.
// ABOUTME: wait-approval runs one waiter in the foreground until it settles.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use stagegate::approval::{ApprovalOutcome, ApprovalWaiter, ExecutionContext, ExecutionLocks};
use stagegate::error::{Error, Result};
use stagegate::itsm::{ChangeKind, ListQuery, NewChangeRequest, NewChangeTask, Record, Table};
use stagegate::output::Output;
use stagegate::types::ExecutionId;

use crate::cli::{ChangeCommands, WaitApprovalArgs};

use super::connection::{connect_callback, connect_itsm, load_config};

fn parse_table(value: &str) -> Result<Table> {
    value
        .parse::<Table>()
        .map_err(|e| Error::InvalidConfig(e.to_string()))
}

fn parse_kind(value: &str) -> Result<ChangeKind> {
    value
        .parse::<ChangeKind>()
        .map_err(|e| Error::InvalidConfig(e.to_string()))
}

fn summary(record: &Record) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.number, record.id, record.state, record.approval, record.title
    )
}

fn show(output: &Output, heading: &str, record: &Record) {
    output.data(heading, &[summary(record)], record);
}

pub async fn change(
    command: ChangeCommands,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<i32> {
    let config = load_config(config_path)?;
    let client = connect_itsm(&config)?;

    match command {
        ChangeCommands::Get { table, id, number } => {
            let table = parse_table(&table)?;
            let record = match (id, number) {
                (Some(id), _) => client.get_record(table, &id).await?,
                (None, Some(number)) => client.get_by_number(table, &number).await?,
                (None, None) => return Err(Error::MissingParameter("id or number")),
            };
            let link = record.link(client.base_url(), table);
            show(output, &link, &record);
        }
        ChangeCommands::List {
            table,
            query,
            state,
            limit,
            parent,
        } => {
            let table = parse_table(&table)?;
            let query = ListQuery {
                query,
                state,
                limit,
            };
            let records = match table {
                Table::ChangeTask => client.list_change_tasks(parent.as_deref(), &query).await?,
                other => client.list(other, &query).await?,
            };
            let lines: Vec<String> = records.iter().map(summary).collect();
            output.data(&format!("{} record(s)", records.len()), &lines, &records);
        }
        ChangeCommands::Create {
            title,
            description,
            kind,
            category,
            priority,
            risk,
            impact,
        } => {
            let request = NewChangeRequest {
                short_description: title,
                description,
                kind,
                category,
                priority,
                risk,
                impact,
            };
            let record = client.create_change_request(&request).await?;
            show(output, "Created change request", &record);
        }
        ChangeCommands::CreateTask {
            change_request,
            title,
            description,
            urgency,
            priority,
        } => {
            let task = NewChangeTask {
                short_description: title,
                description,
                parent: change_request.clone(),
                change_request,
                urgency,
                priority,
            };
            let record = client.create_change_task(&task).await?;
            show(output, "Created change task", &record);
        }
        ChangeCommands::SetState { kind, id, state } => {
            let record = client.set_state(parse_kind(&kind)?, &id, &state).await?;
            show(output, "Updated state", &record);
        }
        ChangeCommands::SetApproval { id, approval } => {
            let record = client.set_approval(&id, &approval).await?;
            show(output, "Updated approval", &record);
        }
    }

    Ok(0)
}

/// Exit 0 when approved, 1 for any other outcome.
pub async fn wait_approval(
    args: WaitApprovalArgs,
    config_path: Option<&Path>,
    output: &mut Output,
) -> Result<i32> {
    let config = load_config(config_path)?;
    let client = connect_itsm(&config)?;
    let (notifier, target) = connect_callback(&config)?;

    let execution_id = args.execution_id.trim();
    if execution_id.is_empty() {
        return Err(Error::MissingParameter("execution-id"));
    }

    let context = ExecutionContext {
        execution_id: ExecutionId::new(execution_id),
        kind: parse_kind(&args.kind)?,
        poll_interval: args
            .poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(config.approval.poll_interval),
        max_polls: args.max_polls.unwrap_or(config.approval.max_polls),
        callback: target,
    };

    output.start_timer();
    output.progress(&format!(
        "Waiting for approval of {} {} (every {:?}, at most {} polls)",
        context.kind, context.execution_id, context.poll_interval, context.max_polls
    ));

    let handle = ApprovalWaiter::new(
        context,
        Arc::new(client),
        Arc::new(notifier),
        ExecutionLocks::new(),
    )
    .spawn();
    let outcome = handle.join().await?;

    match outcome {
        ApprovalOutcome::Approved => output.success("Change approved; reported COMPLETED"),
        ApprovalOutcome::Rejected => output.error("Change rejected; reported FAILED"),
        ApprovalOutcome::Exhausted => {
            output.error("No decision within the poll budget; reported FAILED")
        }
        ApprovalOutcome::AlreadySettled => output.warning("Execution was already reported"),
    }

    Ok(if outcome == ApprovalOutcome::Approved { 0 } else { 1 })
}
