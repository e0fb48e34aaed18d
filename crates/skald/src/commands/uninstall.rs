//! Uninstall an extension

use anyhow::{anyhow, Result};
use skald_core::error::Error;

use crate::cli::{ExtensionArgs, GlobalArgs};
use crate::context::AppContext;
use crate::output;

pub async fn run(args: ExtensionArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;

    let extension = ctx
        .service
        .get(&args.id)
        .ok_or_else(|| Error::unknown_extension(&args.id))?;
    let id = extension.id();

    let dependents: Vec<String> = ctx
        .service
        .installed()
        .iter()
        .filter(|e| e.id() != id && e.dependencies().iter().any(|d| d.eq_ignore_ascii_case(&id)))
        .map(|e| e.display_name())
        .collect();
    if !dependents.is_empty() {
        output::warning(&format!(
            "{} is required by: {}",
            extension.display_name(),
            dependents.join(", ")
        ));
    }

    ctx.service.uninstall(&extension).await?;

    if !ctx.settle(|service| service.get(&id).is_none()).await {
        return Err(anyhow!(
            "Uninstalled {} but the service did not observe the completion",
            id
        ));
    }
    output::success(&format!("Uninstalled {}", id));

    ctx.close();
    Ok(())
}
