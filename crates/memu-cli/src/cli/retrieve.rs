//! `memu retrieve`: query stored memories.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use memu_infra::MemuClient;
use memu_types::request::RetrieveRequest;
use memu_types::result::RetrieveResult;

use super::truncate;

/// Retrieve memories for a free-text query.
///
/// # Examples
///
/// ```bash
/// memu retrieve "what pets does she have?" --user u1 --agent a1
/// ```
pub async fn retrieve(
    client: &MemuClient,
    query: &str,
    user_id: &str,
    agent_id: &str,
    json: bool,
) -> Result<()> {
    let request = RetrieveRequest::new(query, user_id, agent_id);
    let result = client.retrieve(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.is_empty() {
        println!();
        println!(
            "  {} No memories matched '{}'.",
            style("i").blue().bold(),
            style(query).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    if !result.items.is_empty() {
        println!("{}", items_table(&result));
        println!();
    }

    if !result.categories.is_empty() {
        println!("  {}", style("Categories").bold());
        for category in &result.categories {
            let name = category.name.as_deref().unwrap_or("(unnamed)");
            let summary = category
                .summary
                .as_deref()
                .or(category.description.as_deref())
                .unwrap_or("");
            println!("  {} {} {}", style("-").dim(), style(name).cyan(), style(truncate(summary, 70)).dim());
        }
        println!();
    }

    if !result.resources.is_empty() {
        println!(
            "  {} source resource{}",
            style(result.resources.len()).bold(),
            if result.resources.len() == 1 { "" } else { "s" }
        );
    }
    if let Some(next) = &result.next_step_query {
        println!("  {} {}", style("Suggested follow-up:").dim(), style(next).italic());
    }
    println!();

    Ok(())
}

fn items_table(result: &RetrieveResult) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Memory").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Category").fg(Color::White),
        Cell::new("Score").fg(Color::White),
    ]);

    for item in &result.items {
        let text = item
            .summary
            .as_deref()
            .or(item.content.as_deref())
            .unwrap_or("(no summary)");
        let score = item.score.map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));

        table.add_row(vec![
            Cell::new(truncate(text, 60)).fg(Color::White),
            Cell::new(item.memory_type.as_deref().unwrap_or("-")).fg(Color::Magenta),
            Cell::new(item.category_name.as_deref().unwrap_or("-")).fg(Color::Cyan),
            Cell::new(score).fg(Color::Yellow),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use memu_types::memory::MemoryItem;

    #[test]
    fn test_items_table_renders_every_item() {
        let result = RetrieveResult {
            items: vec![
                MemoryItem {
                    summary: Some("Owns a tabby cat".to_string()),
                    score: Some(0.912),
                    ..Default::default()
                },
                MemoryItem {
                    content: Some("Works night shifts".to_string()),
                    memory_type: Some("profile".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let rendered = items_table(&result).to_string();
        assert!(rendered.contains("Owns a tabby cat"));
        assert!(rendered.contains("0.91"));
        assert!(rendered.contains("Works night shifts"));
        assert!(rendered.contains("profile"));
    }
}
