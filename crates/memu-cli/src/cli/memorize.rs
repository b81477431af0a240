//! `memu memorize`: submit a conversation, optionally waiting for extraction.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use memu_core::poll::PollConfig;
use memu_infra::MemuClient;
use memu_types::request::{ConversationMessage, MemorizeRequest};
use memu_types::result::MemorizeResult;

use super::{MemorizeArgs, truncate};

/// Submit a conversation and print the task id (or the final result with `--wait`).
///
/// # Examples
///
/// ```bash
/// memu memorize --user u1 --agent a1 --text "User: I just adopted a cat."
/// memu memorize --user u1 --agent a1 --file chat.json --wait
/// ```
pub async fn memorize(client: &MemuClient, args: MemorizeArgs, json: bool, quiet: bool) -> Result<()> {
    let request = build_request(&args).await?;

    if !args.wait {
        let result = client.memorize(&request).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_submitted(&result);
        }
        return Ok(());
    }

    let spinner = if json || quiet {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        spinner.set_message("Extracting memories...");
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    };

    let poll = PollConfig::new(args.poll_interval, args.wait_timeout);
    let outcome = client.memorize_and_wait(&request, poll).await;
    spinner.finish_and_clear();
    let result = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_completed(&result);
    }
    Ok(())
}

async fn build_request(args: &MemorizeArgs) -> Result<MemorizeRequest> {
    let mut request = MemorizeRequest::new(&args.user_id, &args.agent_id);
    if let Some(name) = &args.user_name {
        request = request.with_user_name(name);
    }
    if let Some(name) = &args.agent_name {
        request = request.with_agent_name(name);
    }
    if let Some(date) = &args.session_date {
        request = request.with_session_date(date);
    }

    request = match (&args.text, &args.file) {
        (Some(text), _) => request.with_conversation_text(text),
        (None, Some(path)) => request.with_conversation(read_conversation(path).await?),
        (None, None) => anyhow::bail!("either --text or --file is required"),
    };
    Ok(request)
}

/// Load a JSON array of `{role, content}` messages.
pub async fn read_conversation(path: &Path) -> Result<Vec<ConversationMessage>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let messages: Vec<ConversationMessage> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of {{role, content}} messages", path.display()))?;
    tracing::debug!(path = %path.display(), messages = messages.len(), "Loaded conversation file");
    Ok(messages)
}

fn print_submitted(result: &MemorizeResult) {
    match &result.task_id {
        Some(task_id) => {
            println!(
                "  {} Memorize task submitted: {}",
                style("*").green().bold(),
                style(task_id).cyan().bold()
            );
            println!(
                "  {}",
                style(format!("Check progress with `memu status {task_id}`")).dim()
            );
        }
        None => {
            println!("  {} Conversation accepted.", style("*").green().bold());
        }
    }
}

fn print_completed(result: &MemorizeResult) {
    println!();
    println!(
        "  {} Memorized {} item{} in {} categor{}",
        style("*").green().bold(),
        style(result.items.len()).bold(),
        if result.items.len() == 1 { "" } else { "s" },
        style(result.categories.len()).bold(),
        if result.categories.len() == 1 { "y" } else { "ies" },
    );
    if let Some(task_id) = &result.task_id {
        println!("  {}", style(format!("task {task_id}")).dim());
    }
    println!();

    for item in &result.items {
        let text = item
            .summary
            .as_deref()
            .or(item.content.as_deref())
            .unwrap_or("(no summary)");
        let kind = item.memory_type.as_deref().unwrap_or("memory");
        println!("  {} {} {}", style("-").dim(), truncate(text, 80), style(format!("[{kind}]")).dim());
    }

    if !result.categories.is_empty() {
        let names: Vec<&str> = result
            .categories
            .iter()
            .filter_map(|c| c.name.as_deref())
            .collect();
        println!();
        println!("  Categories: {}", style(names.join(", ")).cyan());
    }
    println!();
}
