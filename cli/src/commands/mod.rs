pub mod completions;
pub mod count;
pub mod increment;
pub mod schema;
pub mod send;
pub mod set;
pub mod watch;

use std::time::Duration;

use counter_dapp::{CounterDisplay, ReadState, TxState, TxStatus, U256};
use tokio::{sync::watch as tokio_watch, time};

use crate::{
    error::{CliError, Result},
    ui,
};

/// How long a mined write may take to show up in the polled count.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for the first read to settle.
pub async fn first_read(mut updates: tokio_watch::Receiver<ReadState<U256>>) -> Result<U256> {
    let state = updates
        .wait_for(|state| !matches!(state, ReadState::NotLoaded))
        .await
        .map_err(|_| CliError::ReadFailed("read hook stopped".to_string()))?
        .clone();

    match state {
        ReadState::Loaded { value, .. } => Ok(value),
        ReadState::Stale { error, .. } => Err(CliError::ReadFailed(error)),
        ReadState::NotLoaded => Err(CliError::ReadFailed("no value read".to_string())),
    }
}

/// Reports each lifecycle step until the transaction finishes.
pub async fn follow(mut updates: tokio_watch::Receiver<TxState>) -> Result<TxState> {
    let mut shown = None;
    loop {
        let state = updates.borrow_and_update().clone();
        if shown != Some(state.status) {
            shown = Some(state.status);
            report(&state);
        }

        match state.status {
            TxStatus::Success => return Ok(state),
            TxStatus::Exception => {
                return Err(CliError::Transaction {
                    status: state.status.to_string(),
                    reason: state
                        .error
                        .unwrap_or_else(|| "no reason given".to_string()),
                })
            }
            TxStatus::Idle | TxStatus::PendingSignature | TxStatus::Mining => {}
        }

        if updates.changed().await.is_err() {
            return Err(CliError::Message("transaction tracking stopped".to_string()));
        }
    }
}

fn report(state: &TxState) {
    match state.status {
        TxStatus::PendingSignature => ui::status("Waiting for wallet signature"),
        TxStatus::Mining => {
            let hash = state.hash.as_ref().map(ui::format_hash).unwrap_or_default();
            ui::status(format!("{} {hash}", ui::tx_status(state.status)));
        }
        TxStatus::Success => {
            if let Some(receipt) = &state.receipt {
                let gas = receipt
                    .gas_used
                    .map(|gas| format!(", gas used {gas}"))
                    .unwrap_or_default();
                ui::success(format!("Mined in block {}{gas}", receipt.block_number));
            }
        }
        TxStatus::Idle | TxStatus::Exception => {}
    }
}

/// Waits until the count has been re-read at or after `block`.
pub async fn count_after(
    mut updates: tokio_watch::Receiver<ReadState<U256>>,
    block: u64,
) -> Result<U256> {
    let settled = updates.wait_for(
        |state| matches!(state, ReadState::Loaded { block: read_at, .. } if *read_at >= block),
    );

    match time::timeout(SETTLE_TIMEOUT, settled).await {
        Ok(Ok(state)) => state
            .value()
            .copied()
            .ok_or_else(|| CliError::ReadFailed("no value read".to_string())),
        Ok(Err(_)) => Err(CliError::ReadFailed("read hook stopped".to_string())),
        Err(_) => Err(CliError::ReadFailed(format!(
            "count not refreshed within {}s",
            SETTLE_TIMEOUT.as_secs()
        ))),
    }
}

/// Which counter write a command submitted.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    Increment,
    SetCount,
}

/// Prints the count as it stands before writing, if it can be read.
pub async fn show_current(display: &CounterDisplay) {
    match first_read(display.subscribe_count()).await {
        Ok(count) => ui::status(format!("Current count is {count}")),
        Err(err) => ui::warn(err.to_string()),
    }
}

/// Follows the submitted write and prints the refreshed count.
pub async fn settle(display: CounterDisplay, operation: Operation) -> Result<()> {
    let hook = match operation {
        Operation::Increment => display.increment_hook(),
        Operation::SetCount => display.set_count_hook(),
    };
    let state = follow(hook.subscribe()).await?;

    let block = state.receipt.map(|receipt| receipt.block_number).unwrap_or(0);
    let count = count_after(display.subscribe_count(), block).await?;
    display.unmount();

    println!("{count}");
    Ok(())
}
