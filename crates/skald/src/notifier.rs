//! Terminal implementation of the service's prompt collaborator

use async_trait::async_trait;
use dialoguer::Select;
use skald_extensions::{Notifier, Severity};
use tracing::debug;

use crate::output;

/// Prompts through `dialoguer` when attended; otherwise takes the
/// default option without asking.
pub struct TerminalNotifier {
    interactive: bool,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self {
            interactive: console::user_attended(),
        }
    }

    #[cfg(test)]
    fn unattended() -> Self {
        Self { interactive: false }
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn print_message(severity: Severity, message: &str) {
    match severity {
        Severity::Info => output::info(message),
        Severity::Warning => output::warning(message),
        Severity::Error => output::error(message),
    }
}

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn choose(
        &self,
        severity: Severity,
        message: &str,
        options: &[&str],
        default: usize,
    ) -> Option<usize> {
        print_message(severity, message);

        if !self.interactive {
            let choice = options.get(default)?;
            output::info(&format!("Not attended to a terminal, choosing '{}'", choice));
            return Some(default);
        }

        let items: Vec<String> = options.iter().map(|o| o.to_string()).collect();
        let selection = tokio::task::spawn_blocking(move || {
            Select::new()
                .with_prompt("Choose an option")
                .items(&items)
                .default(default)
                .interact_opt()
        })
        .await;

        match selection {
            Ok(Ok(choice)) => choice,
            Ok(Err(e)) => {
                debug!("Prompt failed: {}", e);
                None
            }
            Err(e) => {
                debug!("Prompt task failed: {}", e);
                None
            }
        }
    }

    fn show_error(&self, message: &str) {
        output::error(message);
    }
}
