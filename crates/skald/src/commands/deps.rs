//! Dependency tree

use anyhow::Result;
use console::style;
use skald_extensions::DependencyGraphView;
use std::sync::Arc;

use crate::cli::{ExtensionArgs, GlobalArgs};
use crate::context::AppContext;
use crate::output;

pub async fn run(args: ExtensionArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = AppContext::open(global).await?;
    let extension = ctx.find(&args.id).await?;

    match ctx.service.load_dependencies(&extension).await? {
        None => output::info(&format!("{} has no dependencies", extension.id())),
        Some(root) => {
            let mut lines = Vec::new();
            render(&root, "", &mut lines);
            for line in lines {
                println!("{}", line);
            }
        }
    }

    ctx.close();
    Ok(())
}

fn label(node: &DependencyGraphView) -> String {
    match node.extension() {
        None => format!("{} {}", node.identifier(), style("(not found)").red()),
        Some(extension) => {
            let mut label = format!("{} v{}", node.identifier(), extension.version());
            if node.depth() > 0 && !extension.dependencies().is_empty() && !node.has_dependencies() {
                label.push_str(&format!(" {}", style("(cycle)").yellow()));
            }
            if extension.local().is_none() {
                label.push_str(&format!(" {}", style("(not installed)").dim()));
            }
            label
        }
    }
}

/// Render `node` and its expansion, one line per node
fn render(node: &Arc<DependencyGraphView>, prefix: &str, lines: &mut Vec<String>) {
    if node.depth() == 0 {
        lines.push(label(node));
    }

    let children = node.dependencies();
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        lines.push(format!("{}{}{}", prefix, branch, label(child)));

        let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render(child, &nested, lines);
    }
}
