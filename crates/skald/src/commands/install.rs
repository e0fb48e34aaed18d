//! Install from the gallery or a local package

use anyhow::{anyhow, bail, Result};
use skald_extensions::InstallSource;

use crate::cli::{GlobalArgs, InstallArgs};
use crate::context::AppContext;
use crate::output;

/// Install an extension
///
/// Supports:
/// - Latest gallery version: `skald install publisher.name`
/// - Local package directory or manifest: `skald install --package ./my-ext`
pub async fn run(args: InstallArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;

    let (installed_id, installed_version) = match (args.id, args.package) {
        (_, Some(package)) => {
            let package = if package.is_absolute() {
                package
            } else {
                camino::Utf8PathBuf::try_from(std::env::current_dir()?)?.join(package)
            };
            let spinner = output::spinner(&format!("Installing package {}...", package));
            let result = ctx.service.install(InstallSource::Package(package)).await;
            spinner.finish_and_clear();
            let local = result?;
            output::success(&format!(
                "Installed {} v{} from package",
                local.identifier, local.manifest.version
            ));
            (local.identifier.id, local.manifest.version)
        }
        (Some(id), None) => {
            let extension = ctx.find_in_gallery(&id).await?;
            if let Some(installed) = ctx.service.get(&id) {
                if !installed.outdated() {
                    output::info(&format!(
                        "{} v{} is already installed",
                        installed.id(),
                        installed.version()
                    ));
                    ctx.close();
                    return Ok(());
                }
            }

            let version = extension.latest_version();
            let spinner = output::spinner(&format!("Installing {} v{}...", extension.id(), version));
            let result = ctx.service.install(InstallSource::Gallery(extension)).await;
            spinner.finish_and_clear();
            let local = result?;
            output::success(&format!("Installed {} v{}", local.identifier, version));
            (local.identifier.id, version)
        }
        (None, None) => bail!("Provide an extension id or --package"),
    };

    let tracked = ctx
        .settle(|service| {
            service
                .get(&installed_id)
                .map_or(false, |e| e.version() == installed_version)
        })
        .await;
    if !tracked {
        return Err(anyhow!(
            "Installed {} but the service did not observe the completion",
            installed_id
        ));
    }

    let companions = ctx.service.companion_recommendations(&installed_id);
    if !companions.is_empty() {
        output::info(&format!(
            "Recommended alongside {}: {}",
            installed_id,
            companions.join(", ")
        ));
    }

    ctx.close();
    Ok(())
}
