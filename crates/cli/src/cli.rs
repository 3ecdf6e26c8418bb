// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const QUICKSTART_HELP: &str = "\
Get started:
  objsync set color '\"blue\"'     Store a value and queue it
  objsync get color               Read it back
  objsync pending --list          Show writes not yet delivered
  objsync flush                   Deliver queued writes now";

#[derive(Parser)]
#[command(name = "objsync")]
#[command(version)]
#[command(about = "Local key/value store with durable, ordered sync to a remote store")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Config file (default: <config dir>/objsync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Local store, overriding the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a value locally and queue it for the remote store
    #[command(after_help = "Examples:\n  \
        objsync set count 3                Store the number 3\n  \
        objsync set name ada               Not JSON, stored as the string \"ada\"\n  \
        objsync set prefs '{\"dark\":true}'  Store an object\n  \
        objsync set k v -n team --flush    Write into namespace 'team' and deliver now")]
    Set {
        /// Key
        key: String,

        /// Value as JSON; anything else is stored as a string
        value: String,

        /// Namespace (default: this installation's id)
        #[arg(long, short)]
        namespace: Option<String>,

        /// Deliver queued writes before exiting
        #[arg(long)]
        flush: bool,
    },

    /// Print a locally stored value as JSON
    Get {
        /// Key
        key: String,

        /// Namespace (default: this installation's id)
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Delete a locally stored value (the remote copy is kept)
    Remove {
        /// Key
        key: String,

        /// Namespace (default: this installation's id)
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Show how many writes are waiting for delivery
    Pending {
        /// List each pending write, next to be sent first
        #[arg(long)]
        list: bool,
    },

    /// Deliver queued writes until the queue is empty or delivery stalls
    Flush,

    /// Print this installation's id
    Id,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
