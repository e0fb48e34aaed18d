//! Readme and changelog

use anyhow::Result;

use crate::cli::{ExtensionArgs, GlobalArgs};
use crate::context::AppContext;

pub async fn readme(args: ExtensionArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;
    let extension = ctx.find(&args.id).await?;
    let text = ctx.service.readme(&extension).await?;
    println!("{}", text);
    ctx.close();
    Ok(())
}

pub async fn changelog(args: ExtensionArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;
    let extension = ctx.find(&args.id).await?;
    let text = ctx.service.changelog(&extension).await?;
    println!("{}", text);
    ctx.close();
    Ok(())
}
