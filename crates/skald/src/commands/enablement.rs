//! Enable or disable an extension

use anyhow::Result;
use skald_core::error::Error;
use skald_extensions::EnablementOutcome;

use crate::cli::{EnablementArgs, GlobalArgs};
use crate::context::AppContext;
use crate::output;

/// Toggle an extension
///
/// Supports:
/// - Everywhere: `skald disable publisher.name`
/// - Current workspace folder only: `skald disable publisher.name --workspace`
///
/// When the extension has dependencies, the user chooses whether they are
/// toggled too.
pub async fn run(args: EnablementArgs, enable: bool, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;

    let extension = ctx
        .service
        .get(&args.id)
        .ok_or_else(|| Error::unknown_extension(&args.id))?;
    let verb = if enable { "Enabled" } else { "Disabled" };
    let scope = if args.workspace {
        " for this workspace"
    } else {
        ""
    };

    match ctx
        .service
        .set_enablement(&extension, enable, args.workspace)
        .await?
    {
        EnablementOutcome::Applied {
            extensions,
            changed: true,
        } => output::success(&format!("{} {}{}", verb, extensions.join(", "), scope)),
        EnablementOutcome::Applied { changed: false, .. } => output::info(&format!(
            "{} is already {}{}",
            extension.id(),
            verb.to_lowercase(),
            scope
        )),
        EnablementOutcome::SystemExtension => output::warning(&format!(
            "{} is a system extension and cannot be {}",
            extension.id(),
            verb.to_lowercase()
        )),
        EnablementOutcome::Canceled => output::info("Canceled"),
    }

    ctx.close();
    Ok(())
}
