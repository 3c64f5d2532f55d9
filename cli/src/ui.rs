use colored::{ColoredString, Colorize};
use counter_dapp::{CountView, TxHash, TxStatus};

pub fn status(message: impl AsRef<str>) {
    eprintln!("{} {}", "==>".blue().bold(), message.as_ref());
}

pub fn success(message: impl AsRef<str>) {
    eprintln!("{} {}", "ok".green().bold(), message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", "warn".yellow().bold(), message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    eprintln!("{} {}", "error".red().bold(), message.as_ref());
}

pub fn tx_status(status: TxStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        TxStatus::Idle => label.dimmed(),
        TxStatus::PendingSignature | TxStatus::Mining => label.yellow(),
        TxStatus::Success => label.green(),
        TxStatus::Exception => label.red(),
    }
}

pub fn format_hash(hash: &TxHash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

/// One line describing the counter, marking placeholders and stale values.
pub fn format_view(view: &CountView) -> String {
    match view {
        CountView::Placeholder => format!("{view} {}", "(loading)".dimmed()),
        CountView::Loaded(_) => view.to_string(),
        CountView::Stale { error, .. } => {
            format!("{view} {}", format!("(stale: {error})").yellow())
        }
    }
}
