//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::setting::SettingId;

/// layered-settings: typed settings resolved across ranked value stores
///
/// Setting definitions come from the config file; values are read from
/// every configured store, and the store with the lowest rank wins.
#[derive(Debug, Parser)]
#[command(name = "layered-settings")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run (defaults to `list`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Value store as 'PATH' or 'PATH:RANK' (can be specified multiple times)
    #[arg(long = "store", value_name = "PATH[:RANK]", global = true)]
    pub stores: Vec<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for layered-settings
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "layered-settings.toml")]
        output: PathBuf,
    },

    /// List settings with their effective values
    List {
        /// Only list settings of this category
        #[arg(long)]
        category: Option<String>,

        /// Number of settings to skip
        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Maximum number of settings to list
        #[arg(long)]
        take: Option<usize>,
    },

    /// Print the effective value of one setting
    Get {
        /// Setting id
        id: SettingId,
    },

    /// Validate and apply one or more values as a single batch
    Set {
        /// Assignments in 'ID=VALUE' format
        #[arg(value_name = "ID=VALUE", required = true)]
        assignments: Vec<String>,
    },

    /// Remove the stored value of a setting, restoring its default
    Delete {
        /// Setting id
        id: SettingId,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
