//! Resolve extension links

use anyhow::Result;

use super::info::print_details;
use crate::cli::{GlobalArgs, OpenArgs};
use crate::context::AppContext;

/// Resolve `skald://extension/<id>`. Lookup failures are reported by the
/// service; links of other shapes are ignored.
pub async fn run(args: OpenArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;
    if let Some(extension) = ctx.service.open_url(&args.url).await {
        print_details(&ctx, &extension);
    }
    ctx.close();
    Ok(())
}
