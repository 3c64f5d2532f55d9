use counter_dapp::{display::COUNT_METHOD, Invalidation, ReadHook, U256};

use crate::{backend::Backend, commands, config::Settings, error::Result, ui};

pub async fn run(settings: &Settings) -> Result<()> {
    let backend = Backend::read_only(settings)?;
    ui::status(format!("Reading {}", backend.describe()));

    let hook: ReadHook<U256> = ReadHook::mount(
        &backend.binding,
        backend.reader(),
        &Invalidation::new(),
        COUNT_METHOD,
        settings.read,
    )?;
    let count = commands::first_read(hook.subscribe()).await?;
    hook.unmount();

    println!("{count}");
    Ok(())
}
