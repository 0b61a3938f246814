// src/cli/args.rs
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default, Clone)]
pub struct TransformArgs {
    /// Template files to transform.
    #[arg(required = true, value_name = "TEMPLATE")]
    pub templates: Vec<PathBuf>,

    /// Leave outputs that are newer than their template and includes alone.
    #[arg(long, short = 's')]
    pub skip_up_to_date: bool,

    /// Transform templates concurrently.
    #[arg(long, short = 'p')]
    pub parallel: bool,

    /// Upper bound on concurrent jobs with --parallel (0 = host default).
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Define a variable substituted for `$(NAME)` in templates. Repeatable.
    #[arg(long = "variable", short = 'v', value_name = "NAME=VALUE")]
    pub variables: Vec<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct CleanArgs {
    /// Templates whose outputs should be deleted.
    #[arg(required = true, value_name = "TEMPLATE")]
    pub templates: Vec<PathBuf>,
}
