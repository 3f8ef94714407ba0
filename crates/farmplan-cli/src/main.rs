use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use farmplan_cli::cli::{Cli, Commands};
use farmplan_cli::commands::{optimize, validate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    match cli.command {
        Commands::Optimize { plan, stages, out } => optimize::handle(&plan, stages, out).await,
        Commands::Validate { plan } => validate::handle(&plan),
    }
}
