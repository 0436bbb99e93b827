// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tern - A OneBot v11 gateway client.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod routes;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tern_config::{ConfigError, TernConfig};

/// Tern - A OneBot v11 gateway client.
#[derive(Parser, Debug)]
#[command(name = "tern", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default lookup.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to the gateway and dispatch events until interrupted.
    Serve,
    /// Validate the configuration and print a summary.
    CheckConfig,
}

const EXIT_CONFIG: u8 = 1;
const EXIT_RUNTIME: u8 = 2;

fn load(path: Option<&PathBuf>) -> Result<TernConfig, Vec<ConfigError>> {
    match path {
        Some(path) => tern_config::load_and_validate_path(path),
        None => tern_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("tern: use --help for available commands");
        return ExitCode::SUCCESS;
    };

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            tern_config::render_errors(&errors);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match command {
        Commands::Serve => match serve::run_serve(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(EXIT_RUNTIME)
            }
        },
        Commands::CheckConfig => {
            print!("{}", serve::summary(&config));
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        assert!(stats::allocated::read().unwrap() > 0);
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["tern", "serve", "--config", "/tmp/tern.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/tern.toml")));

        let cli = Cli::try_parse_from(["tern", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }
}
