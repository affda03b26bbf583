//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//!
//! # Dataset Paths
//!
//! Every `DATASET` argument is a dataset directory, or a `.zip` archive
//! written by `jbof pack` (read-only).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::codec::Format;

/// jbof - datasets from just a bunch of files
#[derive(Parser, Debug)]
#[command(name = "jbof")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new, empty dataset
    #[command(
        name = "create",
        long_about = "Create a new, empty dataset directory.\n\n\
            The directory must not exist yet. Dataset metadata is given as a JSON \
            object. An item format template such as '{speaker}-{take:03d}' names new \
            items from their metadata; without one, items get unique generated names.",
        after_help = "\
WORKFLOW EXAMPLES:
    # A dataset whose items are named after their metadata
    jbof create recordings --itemformat '{speaker}-{take:03d}' --meta '{\"license\": \"CC0\"}'

    # A dataset with generated item names
    jbof create scratch"
    )]
    Create {
        /// Directory to create
        dataset: PathBuf,

        /// Item naming template
        #[arg(long, value_name = "TEMPLATE")]
        itemformat: Option<String>,

        /// Dataset metadata as a JSON object
        #[arg(long, value_name = "JSON")]
        meta: Option<String>,
    },

    /// Show dataset metadata and item count
    #[command(name = "info")]
    Info {
        /// Dataset directory or archive
        dataset: PathBuf,
    },

    /// List items, optionally filtered on metadata
    #[command(
        name = "items",
        long_about = "List the items of a dataset.\n\n\
            Each --where KEY=VALUE keeps only items whose metadata has KEY equal to \
            VALUE. VALUE is parsed as JSON when possible (so 3 is a number and \
            [1,2] a list of candidates), otherwise taken as a string. A list-valued \
            metadata entry matches if it equals VALUE or contains it.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Every item
    jbof items recordings

    # Items of one speaker, takes 1 or 2
    jbof items recordings --where speaker=ann --where 'take=[1,2]'

    # With metadata
    jbof items recordings --long"
    )]
    Items {
        /// Dataset directory or archive
        dataset: PathBuf,

        /// Metadata condition (repeatable)
        #[arg(long = "where", value_name = "KEY=VALUE")]
        conditions: Vec<String>,

        /// Print each item's metadata
        #[arg(short, long)]
        long: bool,
    },

    /// Add an item
    #[command(
        name = "add-item",
        after_help = "\
WORKFLOW EXAMPLES:
    # Named by the dataset's item format
    jbof add-item recordings --meta '{\"speaker\": \"ann\", \"take\": 1}'

    # Named explicitly
    jbof add-item recordings --name calibration"
    )]
    AddItem {
        /// Dataset directory
        dataset: PathBuf,

        /// Item name (overrides the item format)
        #[arg(long)]
        name: Option<String>,

        /// Item metadata as a JSON object
        #[arg(long, value_name = "JSON")]
        meta: Option<String>,
    },

    /// Add an array to an item from an existing file
    #[command(
        name = "add-array",
        long_about = "Add an array to an item from an existing file.\n\n\
            Without --format (and without default_format in the config file) the \
            file is copied as-is and its extension decides the format. With a \
            different target format the file is decoded and re-encoded.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Copy a recording
    jbof add-array recordings ann-001 audio --from take1.wav

    # Convert a NumPy array to FLAC
    jbof add-array recordings ann-001 audio --from take1.npy --format flac --samplerate 16000"
    )]
    AddArray {
        /// Dataset directory
        dataset: PathBuf,

        /// Item name
        item: String,

        /// Array name
        name: String,

        /// Source file
        #[arg(long, value_name = "FILE")]
        from: PathBuf,

        /// Store in this format (npy, wav, flac, ogg, mat)
        #[arg(long)]
        format: Option<Format>,

        /// Sample rate for audio formats, if the source has none
        #[arg(long)]
        samplerate: Option<u32>,

        /// Array metadata as a JSON object
        #[arg(long, value_name = "JSON")]
        meta: Option<String>,
    },

    /// List the arrays of an item
    #[command(name = "arrays")]
    Arrays {
        /// Dataset directory or archive
        dataset: PathBuf,

        /// Item name
        item: String,
    },

    /// Delete an item and all its arrays
    #[command(name = "delete-item")]
    DeleteItem {
        /// Dataset directory
        dataset: PathBuf,

        /// Item name
        item: String,
    },

    /// Delete one array of an item
    #[command(name = "delete-array")]
    DeleteArray {
        /// Dataset directory
        dataset: PathBuf,

        /// Item name
        item: String,

        /// Array name
        name: String,
    },

    /// Print the content hash of a dataset
    #[command(
        name = "hash",
        long_about = "Print the content hash of a dataset.\n\n\
            The hash covers the bytes of every file in every item. It does not \
            depend on item names, array names, the order of items, or the \
            dataset's own metadata, so two datasets holding the same files hash \
            the same."
    )]
    Hash {
        /// Dataset directory or archive
        dataset: PathBuf,
    },

    /// Pack a dataset into a zip archive
    #[command(
        name = "pack",
        after_help = "\
WORKFLOW EXAMPLES:
    # Archive a dataset, then read from the archive
    jbof pack recordings recordings.zip
    jbof items recordings.zip"
    )]
    Pack {
        /// Dataset directory
        dataset: PathBuf,

        /// Archive to create
        archive: PathBuf,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for jbof commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    jbof completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    jbof completion zsh >> ~/.zshrc

    # Fish
    jbof completion fish > ~/.config/fish/completions/jbof.fish

    # PowerShell
    jbof completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
