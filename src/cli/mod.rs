pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "envvault")]
#[command(version)]
#[command(about = "Backup, restore and audit Windows system environment variables")]
#[command(
    long_about = "Snapshot the machine-wide environment key, restore earlier snapshots,\nclean up PATH, and find devtool installations across all drives."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the envvault data directory and default catalogs
    Init,

    /// Inspect and edit system environment variables
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Manage environment snapshots
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Scan all drives for developer-tool installations
    Scan {
        /// Scan catalog to use instead of the configured one
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Launch system administration panels
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show the operation history
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// List all system environment variables
    List {
        /// Emit as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a system environment variable
    Set {
        /// Variable name
        name: String,
        /// Variable value
        value: String,

        /// Do not relaunch elevated; fail with the store error instead
        #[arg(long)]
        no_elevate: bool,
    },

    /// Delete a system environment variable
    Delete {
        /// Variable name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Do not relaunch elevated; fail with the store error instead
        #[arg(long)]
        no_elevate: bool,
    },

    /// Remove duplicate, empty and dead entries from the system PATH
    RefreshPath {
        /// Do not relaunch elevated; fail with the store error instead
        #[arg(long)]
        no_elevate: bool,
    },
}

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Export the environment key into a new snapshot
    Create {
        /// Short description embedded in the snapshot filename
        #[arg(short, long, default_value = "")]
        description: String,

        /// Do not relaunch elevated; fail with the export error instead
        #[arg(long)]
        no_elevate: bool,
    },

    /// List snapshots, newest first
    List {
        /// Emit as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a snapshot file
    Delete {
        /// Snapshot filename (or absolute path)
        file: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Restore a snapshot into the environment key
    Restore {
        /// Snapshot filename (or absolute path)
        file: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Do not relaunch elevated; fail with the import error instead
        #[arg(long)]
        no_elevate: bool,
    },
}

#[derive(Subcommand)]
pub enum ToolsCommands {
    /// List the launchable tools
    List,

    /// Launch a tool by id
    Open {
        /// Tool id from `tools list`
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Init => commands::init::execute().await,
            Commands::Env { command } => match command {
                EnvCommands::List { json } => commands::env::list(json).await,
                EnvCommands::Set {
                    name,
                    value,
                    no_elevate,
                } => commands::env::set(&name, &value, no_elevate).await,
                EnvCommands::Delete {
                    name,
                    yes,
                    no_elevate,
                } => commands::env::delete(&name, yes, no_elevate).await,
                EnvCommands::RefreshPath { no_elevate } => {
                    commands::env::refresh_path(no_elevate).await
                }
            },
            Commands::Backup { command } => {
                let config = AppConfig::load()?;
                match command {
                    BackupCommands::Create {
                        description,
                        no_elevate,
                    } => commands::backup::create(&config, &description, no_elevate).await,
                    BackupCommands::List { json } => commands::backup::list(&config, json).await,
                    BackupCommands::Delete { file, yes } => {
                        commands::backup::delete(&config, &file, yes).await
                    }
                    BackupCommands::Restore {
                        file,
                        yes,
                        no_elevate,
                    } => commands::backup::restore(&config, &file, yes, no_elevate).await,
                }
            }
            Commands::Scan { config: catalog, json } => {
                let config = AppConfig::load()?;
                commands::scan::execute(&config, catalog, json).await
            }
            Commands::Tools { command } => {
                let config = AppConfig::load()?;
                match command {
                    ToolsCommands::List => commands::tools::list(&config).await,
                    ToolsCommands::Open { id } => commands::tools::open(&config, &id).await,
                }
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show => commands::config::show().await,
                ConfigCommands::Set { key, value } => commands::config::set(&key, &value).await,
            },
            Commands::History { limit } => commands::history::execute(limit).await,
        }
    }
}
