use crate::commands::{get_all_application_commands, CommandContext, COMMAND_PREFIX};
use crate::components::assistant::messages;
use crate::components::build_assistant;
use crate::config::Config;
use crate::error::{config_error, Error};
use crate::handlers::event_handler;
use crate::shutdown;
use poise::serenity_prelude as serenity;
use serenity::model::user::OnlineStatus;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing_appender::non_blocking::WorkerGuard;
use tracing::{debug, error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Console filter unless `RUST_LOG` says otherwise
const DEFAULT_LOG_FILTER: &str = "info,serenity=warn,poise=warn";
/// The log file keeps debug output of this crate
const FILE_LOG_FILTER: &str = "debug,serenity=warn,poise=warn,hyper=info,reqwest=info";

/// Initialize logging with environment-based configuration.
///
/// When `LOG_FILE` is set, debug output is also appended to that file. The
/// returned guard flushes the file writer and must live until exit.
pub fn init_logging() -> miette::Result<Option<WorkerGuard>> {
    let console = fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    );

    let (file, guard) = match std::env::var("LOG_FILE") {
        Ok(path) if !path.trim().is_empty() => {
            let (dir, file_name) = split_log_path(path.trim())
                .ok_or_else(|| config_error(&format!("LOG_FILE is not a file path: {}", path)))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(FILE_LOG_FILTER));
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(guard)
}

/// Split a log file path into its directory and file name
fn split_log_path(path: &str) -> Option<(PathBuf, PathBuf)> {
    let path = Path::new(path);
    let file_name = path.file_name()?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, PathBuf::from(file_name)))
}

/// Load the application config, refusing to start without it
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(config)),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Initialize and start the Discord bot
pub async fn start_bot(config: Arc<Config>) -> miette::Result<()> {
    rust_i18n::set_locale(&config.bot_locale);
    info!("Setting locale to {}", config.bot_locale);

    let assistant = Arc::new(build_assistant(&config)?);
    let command_data = CommandContext::new(Arc::clone(&config), assistant);

    // Set up framework options
    let options = poise::FrameworkOptions {
        commands: get_all_application_commands(),
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, framework, data| {
            Box::pin(event_handler(ctx, event, framework, data))
        },
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(COMMAND_PREFIX.to_string()),
            // Mentions are booking requests, routed by the message handler
            mention_as_prefix: false,
            ..Default::default()
        },
        ..Default::default()
    };

    // Booking requests arrive as plain messages, so their content is needed
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let activity = config.activity.clone();
    let client_result = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(poise::Framework::new(options, move |ctx, ready, framework| {
            Box::pin(async move {
                info!("{} is connected!", ready.user.name);

                // Set the bot's status
                ctx.set_presence(
                    Some(serenity::ActivityData::playing(&activity)),
                    OnlineStatus::Online,
                );
                info!("Setting activity to {}", activity);

                // Register slash commands
                if let Err(e) =
                    poise::builtins::register_globally(ctx, &framework.options().commands).await
                {
                    error!("Failed to register slash commands: {:?}", e);
                } else {
                    info!("Slash commands registered successfully");
                }

                Ok(command_data)
            })
        }))
        .await;

    // Start the bot
    info!("Starting bot...");
    let mut client = client_result.map_err(Error::from)?;
    let shard_manager = Arc::clone(&client.shard_manager);

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    tokio::spawn(shutdown::handle_signals(shutdown_send));

    // Create a separate task to handle the client
    let client_handle = tokio::spawn(async move { client.start().await.map_err(Error::from) });

    // Wait for either the client to end or a shutdown signal
    tokio::select! {
        result = client_handle => {
            info!("Bot process ended");
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => {
                    error!("Client task error: {:?}", e);
                    Err(Error::Other(format!("Client task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down bot...");
            shard_manager.shutdown_all().await;
            Ok(())
        }
    }
}

/// Handle errors from commands and event handlers
async fn on_error(error: poise::FrameworkError<'_, CommandContext, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Error during setup: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(messages::processing_error()).await {
                error!("Error while sending error message: {:?}", e);
            }
        }
        poise::FrameworkError::UnknownCommand { msg, .. } => {
            // Answered by the message handler
            debug!("Unknown command from user {}", msg.author.id);
        }
        poise::FrameworkError::EventHandler { error, .. } => {
            error!("Error in event handler: {:?}", error);
        }
        error => {
            error!("Other error: {:?}", error);
        }
    }
}
