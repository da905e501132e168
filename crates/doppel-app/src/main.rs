mod cli;
mod commands;
mod ingest;
mod setup;

use anyhow::Result;
use clap::Parser;
use doppel_core::config::AppConfig;
use doppel_core::lifecycle;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    lifecycle::init_tracing(cli.json_logs);

    lifecycle::log_startup();

    let config = AppConfig::load_or_default(cli.config.as_deref());

    let result = match cli.command {
        Commands::Ingest { dir } => commands::ingest(&config, &dir).await,
        Commands::Chunks => commands::list_chunks(&config).await,
        Commands::Analyze => commands::analyze(&config).await,
        Commands::Profile(cmd) => commands::profile(&config, cmd).await,
        Commands::Chat {
            message,
            conversation,
        } => commands::chat(&config, &message, conversation.as_deref()).await,
        Commands::Validate { response } => commands::validate(&config, &response).await,
        Commands::Evaluate { response, query } => {
            commands::evaluate(&config, &response, &query).await
        }
        Commands::Feedback(cmd) => commands::feedback(&config, cmd).await,
        Commands::Conversations { id } => commands::conversations(&config, id.as_deref()).await,
    };

    lifecycle::log_shutdown();
    result
}
