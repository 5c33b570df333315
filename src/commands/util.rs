use crate::commands::{CommandResult, Context};
use tracing::{debug, info};

/// Introduce the bot and show an example request
#[poise::command(slash_command, prefix_command)]
pub async fn start(ctx: Context<'_>) -> CommandResult {
    info!("Start command received from user {}", ctx.author().id);
    ctx.say(ctx.data().assistant.welcome()).await?;
    debug!("Welcome message sent");
    Ok(())
}

/// Explain how to ask for a calendar event
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> CommandResult {
    info!("Help command received from user {}", ctx.author().id);
    ctx.say(ctx.data().assistant.welcome()).await?;
    Ok(())
}
