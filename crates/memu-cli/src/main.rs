//! MemU command-line client.
//!
//! Binary name: `memu`
//!
//! Parses CLI arguments, resolves the client configuration (flags, then
//! `MEMU_*` environment variables, then the config file), and dispatches to
//! the command handler.

mod cli;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use memu_infra::MemuClient;
use memu_infra::config::load_client_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = memu_observe::verbosity_filter(cli.verbose, cli.quiet);
    memu_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need a client
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "memu", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_client_config(&cli.overrides())
        .await
        .context("Failed to resolve MemU client configuration")?;
    tracing::debug!(base_url = config.base_url(), max_retries = config.max_retries(), "Client configured");
    let client = MemuClient::new(config)?;

    let outcome = run(&client, cli).await;

    client.close();
    memu_observe::shutdown_tracing();
    outcome
}

async fn run(client: &MemuClient, cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Memorize(args) => {
            cli::memorize::memorize(client, args, cli.json, cli.quiet).await?;
        }

        Commands::Status { task_id } => {
            cli::status::show_status(client, &task_id, cli.json).await?;
        }

        Commands::Retrieve {
            query,
            user_id,
            agent_id,
        } => {
            cli::retrieve::retrieve(client, &query, &user_id, &agent_id, cli.json).await?;
        }

        Commands::Categories { user_id, agent_id } => {
            cli::categories::list_categories(client, &user_id, agent_id.as_deref(), cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled before the client is built"),
    }

    Ok(())
}
