use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use scriptctl::{
    config::JsonFileStore,
    logging::{self, LogArgs},
    platform::{self, NoStartup},
    tray::terminal,
};

#[derive(Parser, Debug)]
#[command(name = "scripttray", version, about = "Tray menu of your shell commands")]
struct Cli {
    /// Settings directory (defaults to $SCRIPTTRAY_CONFIG_DIR or the user config dir).
    #[arg(long)]
    config_dir: Option<PathBuf>,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let store = match cli.config_dir {
        Some(dir) => JsonFileStore::new(dir),
        None => JsonFileStore::open_default()?,
    };
    let startup = platform::startup_manager().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "start at login unavailable");
        Box::new(NoStartup)
    });

    terminal::run(Box::new(store), startup)
}
