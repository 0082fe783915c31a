// UI layer: everything the user sees. Results go to stdout; the progress
// spinner and error lines go to stderr so output stays pipeable.

use crate::api::UploadResult;
use crate::expiry;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub const USAGE: &str = "Usage: devtrans <put|get> <path|code>\n       devtrans --update";

/// Block printed after a successful upload.
pub fn render_upload(result: &UploadResult) -> String {
    format!(
        "=== DevTrans Upload ===\n Code:   {}\n URL:    {}\n Expires: {}\n=======================",
        result.code,
        result.url,
        expiry::format(&result.expiry)
    )
}

pub fn print_upload(result: &UploadResult) {
    println!("{}", render_upload(result));
}

pub fn render_saved(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("Saved {}", name)
}

pub fn print_saved(path: &Path) {
    println!("{}", render_saved(path));
}

pub fn render_update_hint(remote: &str) -> String {
    format!(
        "New DevTrans version {} available. Run 'devtrans --update' to upgrade.",
        remote
    )
}

/// Coloured only when stdout is a terminal.
pub fn print_update_hint(remote: &str) {
    let hint = render_update_hint(remote);
    if std::io::stdout().is_tty() {
        println!("{}", hint.yellow());
    } else {
        println!("{}", hint);
    }
}

pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "error:".red().bold(), err);
}

/// Spinner shown while a request is in flight. indicatif hides it when
/// stderr is not a terminal.
pub fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
