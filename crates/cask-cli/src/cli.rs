use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cask",
    about = "cask: content-addressed copy-on-write blob store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a chunk store directory
    Init(InitArgs),
    /// Store a file as a blob and emit its manifest
    Put(PutArgs),
    /// Write a blob's bytes to stdout
    Cat(CatArgs),
    /// Resize a stored blob and rewrite its manifest
    Truncate(TruncateArgs),
    /// Show a manifest
    Stat(StatArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub dir: PathBuf,
    /// Blob type recorded in new manifests
    #[arg(long = "type")]
    pub blob_type: Option<String>,
    #[arg(long)]
    pub chunk_size: Option<u32>,
    #[arg(long)]
    pub fanout: Option<u32>,
}

#[derive(Args)]
pub struct PutArgs {
    pub dir: PathBuf,
    pub file: PathBuf,
    /// Write the manifest here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CatArgs {
    pub dir: PathBuf,
    pub manifest: PathBuf,
    #[arg(long, default_value = "0")]
    pub offset: u64,
    #[arg(long)]
    pub length: Option<u64>,
}

#[derive(Args)]
pub struct TruncateArgs {
    pub dir: PathBuf,
    pub manifest: PathBuf,
    pub size: u64,
}

#[derive(Args)]
pub struct StatArgs {
    pub manifest: PathBuf,
}
