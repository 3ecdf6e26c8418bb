// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// A scratch host: its own config file and local store.
pub struct Host {
    pub dir: TempDir,
}

impl Host {
    /// A host whose remote is `url`.
    pub fn with_remote(url: &str) -> Host {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            format!("[remote]\nurl = \"{}\"\nrequest_timeout_ms = 2000\n", url),
        )
        .unwrap();
        Host { dir }
    }

    /// A host pointed at a port nobody listens on.
    pub fn offline() -> Host {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Host::with_remote(&format!("ws://{}", addr))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("data").join("objsync.db")
    }

    /// `objsync` bound to this host's config and store.
    pub fn objsync(&self) -> Command {
        let mut cmd = objsync();
        cmd.arg("--config")
            .arg(self.config_path())
            .arg("--db")
            .arg(self.db_path())
            .env_remove("RUST_LOG");
        cmd
    }

    /// Stdout of a successful command.
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.objsync().args(args).output().unwrap();
        assert!(output.status.success(), "{:?} failed: {:?}", args, output);
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

pub fn objsync() -> Command {
    cargo_bin_cmd!("objsync")
}
