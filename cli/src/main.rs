mod backend;
mod cli;
mod commands;
mod config;
mod error;
mod ui;

use std::future::Future;

use clap::Parser;
use cli::{Cli, Commands};
use config::Settings;
use error::Result;

const LOG_ENV: &str = "COUNTER_DAPP_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.chain.verbose);

    if let Err(err) = run(cli) {
        ui::error(err.to_string());
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env = env_logger::Env::new().filter_or(LOG_ENV, level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let settings = || Settings::resolve(&cli.chain);

    match cli.command {
        Commands::Count => block_on(commands::count::run(&settings()?)),
        Commands::Watch(args) => block_on(commands::watch::run(&settings()?, args)),
        Commands::Increment => block_on(commands::increment::run(&settings()?)),
        Commands::Set(args) => block_on(commands::set::run(&settings()?, args)),
        Commands::Send(args) => block_on(commands::send::run(&settings()?, args)),
        Commands::Schema(args) => commands::schema::run(args),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

fn block_on(task: impl Future<Output = Result<()>>) -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(task)
}
