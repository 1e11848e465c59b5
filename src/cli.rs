// CLI module - command-line argument parsing and handlers
//
// Connection flags override the configuration, and the config subcommand
// manages the config file:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --edit: Open config file in $EDITOR
// - config --path: Show config file path

use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand};
use std::process::Command;

/// Gateway Console - terminal admin console for an AS4 messaging gateway
#[derive(Parser)]
#[command(name = "gwcon")]
#[command(version = VERSION)]
#[command(about = "Terminal admin console for an AS4 messaging gateway", long_about = None)]
pub struct Cli {
    /// Base URL of the gateway's administrative REST API
    #[arg(long)]
    pub url: Option<String>,

    /// Username for the gateway's REST API
    #[arg(long)]
    pub user: Option<String>,

    /// Password for the gateway's REST API
    #[arg(long)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle a CLI subcommand. Returns true if one was handled (exit after).
pub fn handle_command(cli: &Cli) -> bool {
    match &cli.command {
        Some(Commands::Config {
            show,
            reset,
            edit,
            path,
        }) => {
            if *path {
                handle_config_path();
            } else if *show {
                handle_config_show();
            } else if *reset {
                handle_config_reset();
            } else if *edit {
                handle_config_edit();
            } else {
                println!("Usage: gwcon config [--show|--reset|--edit|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --edit    Open config file in $EDITOR");
                println!("  --path    Show config file path");
            }
            true
        }
        None => false,
    }
}

/// Apply connection flag overrides on top of the loaded configuration
pub fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(url) = &cli.url {
        config.base_url = url.clone();
    }
    if let Some(user) = &cli.user {
        config.username = user.clone();
    }
    if let Some(password) = &cli.password {
        config.password = password.clone();
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("Could not determine config path"),
    }
}

fn handle_config_show() {
    let config = Config::from_env();
    // The password is not echoed back
    let mut redacted = config;
    if !redacted.password.is_empty() {
        redacted.password = "********".to_string();
    }
    println!("{}", redacted.to_toml());
}

fn handle_config_reset() {
    let config = Config::default();
    match config.save() {
        Ok(()) => {
            if let Some(path) = Config::config_path() {
                println!("Config reset to defaults: {}", path.display());
            }
        }
        Err(e) => eprintln!("Failed to reset config: {}", e),
    }
}

fn handle_config_edit() {
    let Some(path) = Config::config_path() else {
        eprintln!("Could not determine config path");
        return;
    };

    // Make sure there is a file to edit
    Config::ensure_config_exists();

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    match Command::new(&editor).arg(&path).status() {
        Ok(status) if status.success() => {}
        Ok(status) => eprintln!("Editor exited with {}", status),
        Err(e) => eprintln!("Failed to launch {}: {}", editor, e),
    }
}
