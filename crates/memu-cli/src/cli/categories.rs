//! `memu categories`: list memory categories as a table.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use memu_infra::MemuClient;
use memu_types::memory::MemoryCategory;
use memu_types::request::ListCategoriesRequest;

use super::truncate;

/// List the categories of a user, optionally scoped to one agent.
///
/// # Examples
///
/// ```bash
/// memu categories --user u1
/// memu categories --user u1 --agent a1 --json
/// ```
pub async fn list_categories(
    client: &MemuClient,
    user_id: &str,
    agent_id: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut request = ListCategoriesRequest::new(user_id);
    if let Some(agent_id) = agent_id {
        request = request.with_agent_id(agent_id);
    }
    let categories = client.list_categories(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }

    if categories.is_empty() {
        println!();
        println!(
            "  {} No categories yet for '{}'. Memorize a conversation first.",
            style("i").blue().bold(),
            style(user_id).cyan(),
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  Memory categories for '{}'", style(user_id).cyan().bold());
    println!();
    println!("{}", categories_table(&categories));
    println!();
    println!(
        "  {} categor{}",
        style(categories.len()).bold(),
        if categories.len() == 1 { "y" } else { "ies" }
    );
    println!();

    Ok(())
}

fn categories_table(categories: &[MemoryCategory]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Items").fg(Color::White),
        Cell::new("Summary").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for category in categories {
        let summary = category
            .summary
            .as_deref()
            .or(category.description.as_deref())
            .unwrap_or("");
        let items = category
            .item_count
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        let updated = category
            .updated_at
            .or(category.created_at)
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string());

        table.add_row(vec![
            Cell::new(category.name.as_deref().unwrap_or("(unnamed)")).fg(Color::Cyan),
            Cell::new(items).fg(Color::Yellow),
            Cell::new(truncate(summary, 60)).fg(Color::White),
            Cell::new(updated).fg(Color::DarkGrey),
        ]);
    }
    table
}
