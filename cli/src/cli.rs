use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

pub const BIN_NAME: &str = "counter-dapp";

#[derive(Debug, Parser)]
#[command(name = BIN_NAME)]
#[command(bin_name = BIN_NAME)]
#[command(about = "Read and update an on-chain counter contract")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub chain: ChainOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the current count.
    Count,
    /// Keep printing the count as it changes.
    Watch(WatchArgs),
    /// Add one to the counter.
    Increment,
    /// Overwrite the counter with a positive integer.
    Set(SetArgs),
    /// Send any state-changing contract method.
    Send(SendArgs),
    /// Print the contract interface as JSON.
    Schema(SchemaArgs),
    /// Generate shell completion scripts.
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ChainOptions {
    /// Configuration file (defaults to ./counter-dapp.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON-RPC endpoint of the node.
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Address of the deployed counter contract.
    #[arg(long, global = true)]
    pub address: Option<String>,

    /// Account sending transactions (defaults to the node's first account).
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Run against an in-memory chain instead of a node.
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Starting count of the in-memory chain.
    #[arg(long, global = true, requires = "simulate")]
    pub initial_count: Option<String>,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in milliseconds.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Exit after this many printed updates.
    #[arg(long)]
    pub updates: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// New count.
    pub value: String,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Contract method name.
    pub method: String,

    /// Method arguments, in declaration order.
    pub args: Vec<String>,

    /// Wei attached to the call (payable methods only).
    #[arg(long)]
    pub value: Option<String>,

    /// Gas limit override.
    #[arg(long)]
    pub gas: Option<String>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}
