//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Universal Storage - file operations against a configured storage root
#[derive(Parser, Debug)]
#[command(name = "universal-storage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (JSON, TOML, YAML...); defaults to ./universal-storage.* or ./config.*
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Copy a file into the storage
    Store {
        /// File to copy
        source: String,

        /// Folder inside the storage (the root when omitted)
        target: Option<String>,
    },

    /// Delete a stored file
    RemoveFile {
        path: String,
    },

    /// Create a folder (single level)
    CreateFolder {
        path: String,
    },

    /// Delete a folder and everything in it
    RemoveFolder {
        path: String,
    },

    /// Stage a stored file into tmp and print its location
    Retrieve {
        path: String,
    },

    /// Clear the tmp staging directory
    Clean,

    /// Delete everything under the storage root
    Wipe,
}
