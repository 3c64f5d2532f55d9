use std::time::Duration;

use counter_dapp::{display::COUNT_METHOD, CountView, Invalidation, ReadHook, ReadOptions, U256};
use tokio::signal;

use crate::{
    backend::Backend,
    cli::WatchArgs,
    config::Settings,
    error::{CliError, Result},
    ui,
};

pub async fn run(settings: &Settings, args: WatchArgs) -> Result<()> {
    let options = match args.interval_ms {
        Some(0) => {
            return Err(CliError::InvalidArgument {
                what: "interval",
                input: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            })
        }
        Some(ms) => ReadOptions {
            poll_interval: Duration::from_millis(ms),
        },
        None => settings.read,
    };

    let backend = Backend::read_only(settings)?;
    ui::status(format!(
        "Watching {} every {}ms (ctrl-c to stop)",
        backend.describe(),
        options.poll_interval.as_millis()
    ));

    let hook: ReadHook<U256> = ReadHook::mount(
        &backend.binding,
        backend.reader(),
        &Invalidation::new(),
        COUNT_METHOD,
        options,
    )?;
    let mut updates = hook.subscribe();
    let mut last_shown: Option<CountView> = None;
    let mut printed = 0usize;

    loop {
        let view = CountView::from_state(&updates.borrow_and_update());
        if view != CountView::Placeholder && last_shown.as_ref() != Some(&view) {
            println!("{}", ui::format_view(&view));
            last_shown = Some(view);
            printed += 1;
            if args.updates.is_some_and(|limit| printed >= limit) {
                break;
            }
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = signal::ctrl_c() => break,
        }
    }

    hook.unmount();
    Ok(())
}
