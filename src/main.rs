// Entrypoint for the CLI application.
// - Resolves configuration once and passes it down explicitly.
// - Any error is printed on stderr and the process exits with status 1.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use devtrans::api::ApiClient;
use devtrans::cli::{Action, Cli};
use devtrans::config::Config;
use devtrans::ui;
use devtrans::update::{self, SelfUpdater};
use std::path::Path;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return;
        }
        Err(_) => usage(),
    };

    init_tracing(cli.verbose);

    let Some(action) = cli.action() else {
        usage();
    };

    if let Err(e) = run(action) {
        ui::print_error(&e);
        process::exit(1);
    }
}

fn usage() -> ! {
    println!("{}", ui::USAGE);
    process::exit(1);
}

fn run(action: Action) -> Result<()> {
    let config = Config::resolve();
    let api = ApiClient::new(config.base_url())?;

    match action {
        Action::Put(path) => {
            let token = config.require_token()?;
            let spinner = ui::spinner("Uploading...");
            let result = api.upload(&path, token);
            spinner.finish_and_clear();
            ui::print_upload(&result?);

            if let Some(remote) = update::available_update(&api, update::CURRENT_VERSION) {
                ui::print_update_hint(&remote);
            }
        }
        Action::Get(code) => {
            let spinner = ui::spinner("Downloading...");
            let saved = api.download(&code, Path::new("."));
            spinner.finish_and_clear();
            ui::print_saved(&saved?);
        }
        Action::Update => {
            let updater = SelfUpdater::new()?;
            let spinner = ui::spinner("Updating...");
            let result = updater.update(&api);
            spinner.finish_and_clear();
            result?;
            println!("DevTrans updated successfully");
        }
    }
    Ok(())
}

/// Logs go to stderr. `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
