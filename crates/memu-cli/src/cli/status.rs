//! `memu status`: show one memorize task snapshot.

use anyhow::Result;
use console::style;

use memu_infra::MemuClient;
use memu_types::task::{Task, TaskStatus};

/// Print the current state of a memorize task.
///
/// # Examples
///
/// ```bash
/// memu status task_01HZX...
/// memu status task_01HZX... --json
/// ```
pub async fn show_status(client: &MemuClient, task_id: &str, json: bool) -> Result<()> {
    let task = client.get_task_status(task_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
        return Ok(());
    }

    println!();
    println!("  Task {}", style(&task.task_id).cyan().bold());
    println!();
    println!("  Status:   {}", styled_status(task.status));
    if let Some(progress) = task.progress {
        println!("  Progress: {}", progress_bar(progress));
    }
    if let Some(message) = &task.message {
        println!("  Message:  {message}");
    }
    if let Some(created) = task.created_at {
        println!("  Created:  {}", style(created.format("%Y-%m-%d %H:%M:%S UTC")).dim());
    }
    if let Some(updated) = task.updated_at {
        println!("  Updated:  {}", style(updated.format("%Y-%m-%d %H:%M:%S UTC")).dim());
    }
    print_result_summary(&task);
    println!();

    Ok(())
}

fn styled_status(status: TaskStatus) -> String {
    match status {
        TaskStatus::Pending => style(status).yellow().to_string(),
        TaskStatus::Processing => style(status).blue().to_string(),
        TaskStatus::Completed | TaskStatus::Success => style(status).green().bold().to_string(),
        TaskStatus::Failed => style(status).red().bold().to_string(),
    }
}

/// Ten-cell bar for a 0-100 percentage.
fn progress_bar(percent: f64) -> String {
    let filled = (percent.clamp(0.0, 100.0) / 10.0).round() as usize;
    format!("[{}{}] {percent:.0}%", "#".repeat(filled), "-".repeat(10 - filled))
}

fn print_result_summary(task: &Task) {
    let Some(result) = &task.result else {
        return;
    };
    let count = |key: &str| result.get(key).and_then(|v| v.as_array()).map_or(0, Vec::len);
    println!(
        "  Result:   {} items, {} categories",
        style(count("items")).bold(),
        style(count("categories")).bold()
    );
}
