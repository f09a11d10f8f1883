use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod banner;
pub mod folders;
pub mod send;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one EDF request.
    Send(SendArgs),
    /// Fetch and print the login banner.
    Banner(BannerArgs),
    /// Log in and print the folder list.
    Folders(FoldersArgs),
    /// Print announcements as the server pushes them.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Banner(args) => banner::run(args, format),
        Command::Folders(args) => folders::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Server address (host:port).
    pub addr: String,
    /// Inline EDF request text.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub edf: Option<String>,
    /// Read the EDF request from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Wait for the reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "30s")]
    pub reply_timeout: String,
}

#[derive(Args, Debug)]
pub struct BannerArgs {
    /// Server address (host:port).
    pub addr: String,
}

#[derive(Args, Debug)]
pub struct FoldersArgs {
    /// Server address (host:port).
    pub addr: String,
    /// Account name to log in as.
    #[arg(long)]
    pub user: String,
    /// Account password.
    #[arg(long, env = "UAWIRE_PASSWORD")]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Server address (host:port).
    pub addr: String,
    /// Announcement kinds to subscribe to (repeatable, comma-separated).
    #[arg(long = "kind", value_name = "KIND", value_delimiter = ',', required = true)]
    pub kinds: Vec<String>,
    /// Exit after printing N announcements.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
