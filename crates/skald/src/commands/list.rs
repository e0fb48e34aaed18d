//! List installed extensions

use anyhow::Result;
use tabled::{settings::Style, Table};

use super::ExtensionRow;
use crate::cli::{GlobalArgs, ListArgs};
use crate::context::AppContext;
use crate::output;

/// List installed extensions
///
/// Supports:
/// - Everything installed: `skald list`
/// - Only outdated (syncs with the gallery first): `skald list --outdated`
/// - JSON output: `skald list --json`
pub async fn run(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;

    if args.outdated {
        let spinner = output::spinner("Checking the gallery for updates...");
        let synced = ctx.service.check_for_updates().await;
        spinner.finish_and_clear();
        synced?;
    }

    let mut extensions = ctx.service.installed();
    if args.outdated {
        extensions.retain(|e| e.outdated());
    }
    extensions.sort_by_key(|e| e.id());

    let rows: Vec<ExtensionRow> = extensions
        .iter()
        .map(|e| ExtensionRow::new(&ctx.service, e))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        output::info(if args.outdated {
            "All extensions are up to date"
        } else {
            "No extensions installed"
        });
    } else {
        let mut table = Table::new(&rows);
        table.with(Style::sharp());
        println!("{}", table);
        output::info(&format!("{} extension(s)", rows.len()));
    }

    ctx.close();
    Ok(())
}
