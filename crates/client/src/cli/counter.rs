//! Counter demo CLI commands.

use clap::{Parser, Subcommand};

/// Counter commands.
#[derive(Debug, Parser)]
pub struct CounterCommand {
    #[command(subcommand)]
    pub action: CounterAction,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CounterAction {
    /// Show the persisted value.
    Show,
    Increment,
    Decrement,
    Reset,
}
