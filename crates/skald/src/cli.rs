//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use skald_extensions::ledger::DEFAULT_LOG_TAIL_LINES;

/// Skald - install, update and toggle extensions along with their dependencies
#[derive(Parser, Debug)]
#[command(name = "skald")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Skald data directory (defaults to ~/.skald)
    #[arg(long, env = "SKALD_HOME", global = true)]
    pub home: Option<Utf8PathBuf>,

    /// Workspace folder for workspace-scoped enablement (defaults to the current directory)
    #[arg(long, global = true)]
    pub folder: Option<Utf8PathBuf>,

    /// Ignore the workspace folder; only global enablement applies
    #[arg(long, global = true, conflicts_with = "folder")]
    pub no_folder: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Options shared by every command
    pub fn global(&self) -> GlobalArgs {
        GlobalArgs {
            home: self.home.clone(),
            folder: self.folder.clone(),
            no_folder: self.no_folder,
        }
    }
}

/// Options every command needs to open the service
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub home: Option<Utf8PathBuf>,
    pub folder: Option<Utf8PathBuf>,
    pub no_folder: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List installed extensions
    List(ListArgs),

    /// Search the gallery
    Search(SearchArgs),

    /// Show details of an extension
    Info(ExtensionArgs),

    /// Install from the gallery or a local package
    Install(InstallArgs),

    /// Uninstall an extension
    Uninstall(ExtensionArgs),

    /// Enable an extension (and optionally its dependencies)
    Enable(EnablementArgs),

    /// Disable an extension (and optionally its dependencies)
    Disable(EnablementArgs),

    /// Sync installed extensions with the gallery and report updates
    CheckUpdates,

    /// Install newer gallery versions of outdated extensions
    Update(UpdateArgs),

    /// Show the dependency tree of an extension
    Deps(ExtensionArgs),

    /// Print an extension's readme
    Readme(ExtensionArgs),

    /// Print an extension's changelog
    Changelog(ExtensionArgs),

    /// Companion extensions recommended alongside an installed one
    Recommend(ExtensionArgs),

    /// Resolve a skald://extension/<id> link
    Open(OpenArgs),

    /// Show the telemetry log
    Log(LogArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only extensions with a newer gallery version (syncs first)
    #[arg(long)]
    pub outdated: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text matched against extension ids and names
    pub text: String,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Commands taking a single extension id
#[derive(Args, Debug)]
pub struct ExtensionArgs {
    /// Extension id (publisher.name)
    pub id: String,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Gallery extension id (publisher.name)
    #[arg(required_unless_present = "package", conflicts_with = "package")]
    pub id: Option<String>,

    /// Install from a package directory or extension.yaml file
    #[arg(long)]
    pub package: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct EnablementArgs {
    /// Extension id (publisher.name)
    pub id: String,

    /// Change the flag for the current workspace only
    #[arg(long)]
    pub workspace: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Extensions to update (defaults to every outdated extension)
    pub ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Link such as skald://extension/publisher.name
    pub url: String,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Number of most recent events to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_TAIL_LINES)]
    pub limit: usize,

    /// Only events of this extension
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Show event counts instead of events
    #[arg(long)]
    pub stats: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
