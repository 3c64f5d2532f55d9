use counter_dapp::Dispatch;

use crate::{
    backend::Backend,
    commands::{self, Operation},
    config::Settings,
    error::{CliError, Result},
    ui,
};

pub async fn run(settings: &Settings) -> Result<()> {
    let backend = Backend::with_wallet(settings).await?;
    ui::status(format!("Incrementing {}", backend.describe()));

    let display = backend.mount_display(settings)?;
    commands::show_current(&display).await;

    if display.increment()? == Dispatch::Busy {
        return Err(CliError::Message("a transaction is already in flight".to_string()));
    }
    commands::settle(display, Operation::Increment).await
}
