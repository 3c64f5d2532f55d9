use counter_dapp::Dispatch;

use crate::{
    backend::Backend,
    cli::SetArgs,
    commands::{self, Operation},
    config::Settings,
    error::{CliError, Result},
    ui,
};

pub async fn run(settings: &Settings, args: SetArgs) -> Result<()> {
    // reject bad input before touching the chain
    let value = counter_dapp::parse_count_input(&args.value)?;

    let backend = Backend::with_wallet(settings).await?;
    ui::status(format!("Setting {} to {value}", backend.describe()));

    let display = backend.mount_display(settings)?;
    commands::show_current(&display).await;

    if display.submit_set_count(&args.value)? == Dispatch::Busy {
        return Err(CliError::Message("a transaction is already in flight".to_string()));
    }
    commands::settle(display, Operation::SetCount).await
}
