// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exit codes and output of the `tern` binary.

use std::io::Write;
use std::process::{Command, Output};

fn tern(args: &[&str], config: &str) -> Output {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config.as_bytes()).unwrap();
    Command::new(env!("CARGO_BIN_EXE_tern"))
        .args(args)
        .arg("--config")
        .arg(file.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn check_config_prints_summary() {
    let out = tern(
        &["check-config"],
        r#"
[connection]
mode = "reverse"
port = 6700

[[routes]]
kind = "group"
id = 5
plugins = ["echo"]
require_mention = true
"#,
    );
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("config OK"));
    assert!(stdout.contains("reverse 127.0.0.1:6700/"));
    assert!(stdout.contains("routes:     1"));
}

#[test]
fn invalid_config_exits_with_one() {
    let out = tern(&["check-config"], "[connection]\nbogus = 1\n");
    assert_eq!(out.status.code(), Some(1));

    let out = tern(&["serve"], "[connection]\nport = 0\n");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn unreachable_gateway_exits_with_two() {
    let out = tern(
        &["serve"],
        "[connection]\nhost = \"127.0.0.1\"\nport = 1\nconnect_timeout_ms = 2000\n",
    );
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
}
