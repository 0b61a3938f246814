use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod args;
pub mod handlers;

use args::{CleanArgs, TransformArgs};

/// ttbuild: an incremental text-template build step.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Seconds to wait for another instance working on the same templates.
    #[arg(long, short = 't', global = true, value_name = "SECONDS")]
    pub lock_timeout: Option<u64>,

    /// Configuration file to use instead of the discovered one.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Regenerate the outputs of the given templates.
    Transform(TransformArgs),
    /// Delete the outputs of the given templates.
    Clean(CleanArgs),
}
