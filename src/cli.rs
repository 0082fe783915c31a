// Command-line surface: `put <path>`, `get <code>` or `--update`.
// Anything else is a usage error.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "devtrans",
    version,
    about = "Upload and download files through a DevTrans server",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Replace this binary with the latest build published by the server
    #[arg(long)]
    pub update: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a file and print its retrieval code
    Put { path: PathBuf },
    /// Download the file behind a retrieval code into the current directory
    Get { code: String },
}

/// What one invocation does.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Put(PathBuf),
    Get(String),
    Update,
}

impl Cli {
    /// `None` when the flags and subcommand do not form a valid request.
    pub fn action(self) -> Option<Action> {
        match (self.update, self.command) {
            (true, None) => Some(Action::Update),
            (false, Some(Command::Put { path })) => Some(Action::Put(path)),
            (false, Some(Command::Get { code })) => Some(Action::Get(code)),
            _ => None,
        }
    }
}
