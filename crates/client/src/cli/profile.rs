//! Profile CLI commands.

use clap::{Parser, Subcommand};

/// Profile commands.
#[derive(Debug, Parser)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub action: ProfileAction,
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// Show the signed-in user's profile.
    Show,
    /// Change profile fields; unset flags are left alone.
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Change the password.
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
}
