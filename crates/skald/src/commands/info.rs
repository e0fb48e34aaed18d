//! Extension details

use anyhow::Result;
use skald_extensions::ExtensionEntity;

use super::status_label;
use crate::cli::{ExtensionArgs, GlobalArgs};
use crate::context::AppContext;
use crate::output;

pub async fn run(args: ExtensionArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;
    let extension = ctx.find(&args.id).await?;
    print_details(&ctx, &extension);
    ctx.close();
    Ok(())
}

/// Key facts about one extension
pub(crate) fn print_details(ctx: &AppContext, extension: &ExtensionEntity) {
    output::header(&extension.display_name());
    output::kv("Id", &extension.id());
    output::kv("Publisher", &extension.publisher_display_name());
    output::kv("Version", &extension.version());
    if extension.outdated() {
        output::kv("Update available", &extension.latest_version());
    }
    output::kv("Status", &status_label(&ctx.service, extension));
    if extension.is_system() {
        output::kv("Type", "system");
    }
    if let Some(description) = extension.description() {
        output::kv("Description", &description);
    }

    let dependencies = extension.dependencies();
    if !dependencies.is_empty() {
        output::kv("Depends on", &dependencies.join(", "));
    }
    if let Some(installs) = extension.install_count() {
        output::kv("Installs", &installs.to_string());
    }
    if let (Some(rating), Some(count)) = (extension.rating(), extension.rating_count()) {
        if count > 0 {
            output::kv("Rating", &format!("{:.1} ({} ratings)", rating, count));
        }
    }
    if let Some(license) = extension.license_url() {
        output::kv("License", &license);
    }
    if let Some(local) = extension.local() {
        output::kv("Location", local.location.as_str());
    }
}
