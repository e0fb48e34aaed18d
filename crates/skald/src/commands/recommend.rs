//! Companion recommendations

use anyhow::Result;

use crate::cli::{ExtensionArgs, GlobalArgs};
use crate::context::AppContext;
use crate::output;

pub async fn run(args: ExtensionArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;

    let companions = ctx.service.companion_recommendations(&args.id);
    if companions.is_empty() {
        output::info(&format!("No recommendations for {}", args.id));
    } else {
        output::header(&format!("Recommended alongside {}", args.id));
        for id in companions {
            println!("  {}", id);
        }
    }

    ctx.close();
    Ok(())
}
