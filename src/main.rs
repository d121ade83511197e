// ABOUTME: Entry point for the stagegate CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::TransitionKind;
use stagegate::error::Result;
use stagegate::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));

    match run(cli, &mut output).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<i32> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Promote(args) => {
            commands::transition(TransitionKind::Promote, args, config, output).await
        }
        Commands::Demote(args) => {
            commands::transition(TransitionKind::Demote, args, config, output).await
        }
        Commands::Deploy(args) => commands::deploy(args, config, output).await,
        Commands::Deliver(args) => commands::deliver(args, config, output).await,
        Commands::Upload(args) => commands::upload(args, config, output).await,
        Commands::RollbackArea(args) => commands::rollback_area(args, config, output).await,
        Commands::CreateBaseline(args) => commands::create_baseline(args, config, output).await,
        Commands::Action(args) => commands::action(args, config, output).await,
        Commands::Areas {
            product,
            project,
            stage,
            types,
        } => {
            let types = types.into_iter().map(Into::into).collect();
            commands::areas(
                product.as_deref(),
                project.as_deref(),
                stage.as_deref(),
                types,
                config,
                output,
            )
            .await
        }
        Commands::Projects { product, only } => {
            commands::projects(&product, only.into(), config, output).await
        }
        Commands::Baselines { product } => commands::baselines(&product, config, output).await,
        Commands::Stages => commands::stages(config, output).await,
        Commands::WaitDeployment(args) => commands::wait_deployment(args, config, output).await,
        Commands::Change(command) => commands::change(command, config, output).await,
        Commands::WaitApproval(args) => commands::wait_approval(args, config, output).await,
    }
}
