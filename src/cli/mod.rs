//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Simplex using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code for a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for a job ending in anything but `COMPLETE`
pub const EXIT_JOB_FAILED: i32 = 3;
/// Exit code for unexpected failures
pub const EXIT_FATAL: i32 = 5;

/// Simplex - terminology authoring job orchestration
#[derive(Parser, Debug)]
#[command(name = "simplex")]
#[command(version, about, long_about = None)]
#[command(author = "Simplex Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "simplex.toml", env = "SIMPLEX_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SIMPLEX_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Reconcile a refset with a JSON member list and wait for the job
    Reconcile(commands::reconcile::ReconcileArgs),

    /// Run the job schedulers until interrupted
    Serve(commands::serve::ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_reconcile() {
        let cli = Cli::parse_from([
            "simplex",
            "reconcile",
            "--code-system",
            "SNOMEDCT-XX",
            "--refset",
            "100",
            "--members",
            "members.json",
        ]);
        assert_eq!(cli.config, "simplex.toml");
        match cli.command {
            Commands::Reconcile(args) => {
                assert_eq!(args.code_system, "SNOMEDCT-XX");
                assert_eq!(args.refset, "100");
                assert_eq!(args.refset_type, "simple");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["simplex", "--config", "custom.toml", "serve"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["simplex", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["simplex", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
