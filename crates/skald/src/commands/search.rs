//! Gallery search

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

use super::status_label;
use crate::cli::{GlobalArgs, SearchArgs};
use crate::context::AppContext;
use crate::output;

#[derive(Tabled, serde::Serialize)]
struct SearchRow {
    id: String,
    name: String,
    version: String,
    installs: String,
    status: String,
    description: String,
}

pub async fn run(args: SearchArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;

    let page_index = args.page.saturating_sub(1) as usize;
    let page = ctx.service.search(&args.text, page_index).await?;

    let rows: Vec<SearchRow> = page
        .items
        .iter()
        .map(|e| SearchRow {
            id: e.id(),
            name: e.display_name(),
            version: e.latest_version(),
            installs: e
                .install_count()
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            status: status_label(&ctx.service, e),
            description: e.description().unwrap_or_default(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        output::info(&format!("No extensions match '{}'", args.text));
    } else {
        let mut table = Table::new(&rows);
        table.with(Style::sharp());
        println!("{}", table);
        output::info(&format!(
            "Page {} of {} ({} match(es))",
            page.page + 1,
            page.page_count().max(1),
            page.total
        ));
    }

    ctx.close();
    Ok(())
}
