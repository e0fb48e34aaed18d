//! Update checks and updates of outdated extensions

use anyhow::{bail, Result};
use skald_core::error::Error;
use skald_extensions::{ExtensionEntity, InstallSource};
use tabled::{settings::Style, Table, Tabled};

use crate::cli::{GlobalArgs, UpdateArgs};
use crate::context::AppContext;
use crate::output;

#[derive(Tabled)]
struct UpdateRow {
    id: String,
    installed: String,
    available: String,
}

/// Sync with the gallery and report outdated extensions.
///
/// Outdated extensions are updated right away when `auto-update` is on.
pub async fn check(global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;

    let outdated = sync(&ctx).await?;
    if outdated.is_empty() {
        output::success("All extensions are up to date");
        ctx.close();
        return Ok(());
    }

    let rows: Vec<UpdateRow> = outdated
        .iter()
        .map(|e| UpdateRow {
            id: e.id(),
            installed: e.version(),
            available: e.latest_version(),
        })
        .collect();
    let mut table = Table::new(&rows);
    table.with(Style::sharp());
    println!("{}", table);

    if ctx.settings.auto_update {
        output::info("auto-update is on; updating");
        update_all(&ctx, outdated).await?;
    } else {
        output::info(&format!(
            "{} update(s) available. Run `skald update` to install them",
            rows.len()
        ));
    }

    ctx.close();
    Ok(())
}

/// Install the gallery version of outdated extensions
pub async fn run(args: UpdateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;

    let mut outdated = sync(&ctx).await?;
    if !args.ids.is_empty() {
        for id in &args.ids {
            let extension = ctx
                .service
                .get(id)
                .ok_or_else(|| Error::unknown_extension(id))?;
            if !extension.outdated() {
                output::info(&format!("{} is up to date", extension.id()));
            }
        }
        outdated.retain(|e| args.ids.iter().any(|id| id.eq_ignore_ascii_case(&e.id())));
    }

    if outdated.is_empty() {
        output::success("Nothing to update");
    } else {
        update_all(&ctx, outdated).await?;
    }

    ctx.close();
    Ok(())
}

async fn sync(ctx: &AppContext) -> Result<Vec<ExtensionEntity>> {
    let spinner = output::spinner("Checking the gallery for updates...");
    let synced = ctx.service.check_for_updates().await;
    spinner.finish_and_clear();
    synced?;

    let mut outdated: Vec<ExtensionEntity> = ctx
        .service
        .installed()
        .into_iter()
        .filter(|e| e.outdated())
        .collect();
    outdated.sort_by_key(|e| e.id());
    Ok(outdated)
}

/// Update each extension in turn; failures are reported and counted
async fn update_all(ctx: &AppContext, outdated: Vec<ExtensionEntity>) -> Result<()> {
    let total = outdated.len();
    let mut failed = Vec::new();

    for extension in outdated {
        let id = extension.id();
        let target = extension.latest_version();
        let spinner = output::spinner(&format!("Updating {} to v{}...", id, target));
        let result = ctx.service.install(InstallSource::Gallery(extension)).await;
        spinner.finish_and_clear();

        match result {
            Ok(_) => {
                let settled = ctx
                    .settle(|service| service.get(&id).map_or(false, |e| e.version() == target))
                    .await;
                if settled {
                    output::success(&format!("Updated {} to v{}", id, target));
                } else {
                    output::warning(&format!("Updated {} but the change was not observed", id));
                }
            }
            Err(e) => {
                output::error(&format!("Failed to update {}: {}", id, e));
                failed.push(id);
            }
        }
    }

    if !failed.is_empty() {
        bail!(
            "{} of {} update(s) failed: {}",
            failed.len(),
            total,
            failed.join(", ")
        );
    }
    Ok(())
}
