//! Command trait and context for dispatching commands

use std::time::Instant;

use crate::cli::Cli;
use filerec_core::config::RecommenderConfig;
use filerec_core::error::Result;

/// Load the explicit `--config` file, or the default one when present
pub fn load_config(cli: &Cli) -> Result<RecommenderConfig> {
    match &cli.config {
        Some(path) => RecommenderConfig::load(path),
        None => RecommenderConfig::load_default(),
    }
}

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub config: &'a RecommenderConfig,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, config: &'a RecommenderConfig, start: Instant) -> Self {
        Self { cli, config, start }
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("filerec {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Batch file recommendations from content and ratings.");
        println!();
        println!("Run `filerec --help` for usage information.");
        Ok(())
    }
}
