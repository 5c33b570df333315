use calendar_assistant::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    let _log_guard = startup::init_logging()?;

    info!("Starting calendar assistant");

    // Load configuration, a missing bot token stops us here
    let config = startup::load_config()?;

    // Start the bot
    startup::start_bot(config).await
}
