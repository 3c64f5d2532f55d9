use std::io;

use clap::CommandFactory;
use clap_complete::generate;

use crate::{
    cli::{Cli, CompletionsArgs, BIN_NAME},
    error::Result,
};

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut stdout = io::stdout().lock();
    generate(args.shell, &mut Cli::command(), BIN_NAME, &mut stdout);
    Ok(())
}
