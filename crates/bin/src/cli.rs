//! CLI argument definitions for the Quilt binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quilt::{ActorId, ChangeHash};

use crate::output::OutputFormat;

/// Quilt document tool
#[derive(Parser, Debug)]
#[command(name = "quilt")]
#[command(about = "Quilt: inspect, edit, merge and sync replicated document snapshots")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the heads, change count and actors of a snapshot
    Info(FileArgs),
    /// Print a snapshot's contents as JSON
    Dump(DumpArgs),
    /// Print the change log of a snapshot in causal order
    Log(FileArgs),
    /// Set a key of the root map and commit
    Put(PutArgs),
    /// Merge one snapshot into another
    Merge(MergeArgs),
    /// Run the sync protocol between two snapshots until both converge
    Sync(SyncArgs),
}

/// A single snapshot file
#[derive(clap::Args, Debug)]
pub struct FileArgs {
    /// Snapshot file
    pub file: PathBuf,
}

/// Arguments for the dump command
#[derive(clap::Args, Debug)]
pub struct DumpArgs {
    /// Snapshot file
    pub file: PathBuf,

    /// Show the document as of these heads instead of its current state
    #[arg(long = "at", value_name = "HASH")]
    pub at: Vec<ChangeHash>,
}

/// Arguments for the put command
#[derive(clap::Args, Debug)]
pub struct PutArgs {
    /// Snapshot file, created if it does not exist
    pub file: PathBuf,

    /// Root map key
    pub key: String,

    /// Value as a JSON scalar: a number, `true`, `false`, `null` or a quoted string.
    /// Anything that is not valid JSON is stored as a plain string.
    pub value: String,

    /// Actor id (hex) to record the edit as
    #[arg(long, env = "QUILT_ACTOR")]
    pub actor: Option<ActorId>,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Arguments for the merge command
#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    /// Snapshot to merge into
    pub target: PathBuf,

    /// Snapshot to merge from
    pub source: PathBuf,

    /// Write the result here instead of overwriting the target
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the sync command
#[derive(clap::Args, Debug)]
pub struct SyncArgs {
    pub left: PathBuf,

    pub right: PathBuf,

    /// Give up after this many rounds
    #[arg(long, default_value_t = 64)]
    pub max_rounds: usize,
}
