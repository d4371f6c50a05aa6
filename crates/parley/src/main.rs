// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - real-time conversation routing hub.
//!
//! This is the binary entry point for the Parley server.

use clap::{Parser, Subcommand};

mod serve;

/// Parley - real-time conversation routing hub.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the routing hub server.
    Serve,
    /// Load and validate configuration, then print a summary.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match parley_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(err) = serve::run_serve(config).await {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => print_config_summary(&config),
    }
}

/// Print the effective configuration for `parley check-config`.
fn print_config_summary(config: &parley_config::ParleyConfig) {
    println!("configuration OK");
    println!("  hub.log_level        = {}", config.hub.log_level);
    println!("  hub.mailbox_capacity = {}", config.hub.mailbox_capacity);
    println!(
        "  gateway              = {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!(
        "  gateway.bearer_token = {}",
        if config.gateway.bearer_token.is_some() {
            "[set]"
        } else {
            "[not set]"
        }
    );
    println!(
        "  archive.endpoint     = {}",
        config.archive.endpoint.as_deref().unwrap_or("[log only]")
    );
    println!("  metrics.enabled      = {}", config.metrics.enabled);
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config = parley_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.gateway.port, 8090);
    }
}
