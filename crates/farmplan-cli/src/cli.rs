//! Command structures and arg parsing (via clap).

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "farmplan", about = "Farm planting/labor schedule optimizer")]
pub struct Cli {
    /// Set the logging level.
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a plan and print the optimization result as JSON.
    Optimize {
        /// Path to a JSON-encoded `Plan`.
        plan: String,

        /// Stage names to run, in order (defaults to the configured stage list).
        #[arg(long, value_delimiter = ',')]
        stages: Option<Vec<String>>,

        /// Write the result to this file instead of stdout.
        #[arg(long)]
        out: Option<String>,
    },

    /// Validate a plan without solving it.
    Validate {
        /// Path to a JSON-encoded `Plan`.
        plan: String,
    },
}
