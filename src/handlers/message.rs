use crate::commands::{is_command_name, CommandContext, COMMAND_PREFIX};
use crate::components::RawMessage;
use crate::error::{BotResult, Error};
use poise::serenity_prelude as serenity;
use tracing::{debug, error};

/// Gateway events outside of commands
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, CommandContext, Error>,
    data: &CommandContext,
) -> BotResult<()> {
    if let serenity::FullEvent::Message { new_message } = event {
        handle_message(ctx, new_message, data).await;
    }
    Ok(())
}

/// Treat any other text as a booking request and always answer it
async fn handle_message(ctx: &serenity::Context, msg: &serenity::Message, data: &CommandContext) {
    if msg.author.bot {
        return;
    }

    let bot_id = ctx.cache.current_user().id;
    let mentions_bot = msg.mentions.iter().any(|user| user.id == bot_id);
    let text = match classify_message(
        &msg.content,
        msg.guild_id.is_none(),
        mentions_bot,
        bot_id.get(),
    ) {
        Incoming::Ignore => return,
        Incoming::Welcome => {
            debug!("Answering command-like message from user {}", msg.author.id);
            send_reply(ctx, msg, data.assistant.welcome()).await;
            return;
        }
        Incoming::Request(text) => text,
    };

    debug!("Booking request from user {}", msg.author.id);
    let typing = msg.channel_id.start_typing(&ctx.http);

    let request = RawMessage::new(msg.author.id.get(), text);
    let reply = data.assistant.handle_text(&request).await;

    typing.stop();
    send_reply(ctx, msg, reply).await;
}

async fn send_reply(ctx: &serenity::Context, msg: &serenity::Message, reply: String) {
    if let Err(e) = msg.reply(ctx, reply).await {
        error!("Failed to send reply to user {}: {:?}", msg.author.id, e);
    }
}

/// What the message handler does with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// Not addressed to the bot, or answered by the command framework
    Ignore,
    /// Command-like text the framework does not answer
    Welcome,
    /// Booking request text, mention stripped
    Request(String),
}

/// Decide how to answer a message.
///
/// Direct messages are always handled, guild messages only when they mention
/// the bot. Registered prefix commands are left to the command framework,
/// unknown ones addressed to the bot get the welcome text. A mention followed
/// only by a command name is answered like the command.
pub fn classify_message(
    content: &str,
    is_direct: bool,
    mentions_bot: bool,
    bot_id: u64,
) -> Incoming {
    let content = content.trim();
    if content.is_empty() {
        return Incoming::Ignore;
    }

    if let Some(command) = content.strip_prefix(COMMAND_PREFIX) {
        let name = command.split_whitespace().next().unwrap_or_default();
        return if is_command_name(name) || (!is_direct && !mentions_bot) {
            Incoming::Ignore
        } else {
            Incoming::Welcome
        };
    }

    if !is_direct && !mentions_bot {
        return Incoming::Ignore;
    }

    let text = content
        .replace(&format!("<@{}>", bot_id), "")
        .replace(&format!("<@!{}>", bot_id), "");
    let text = text.trim();

    if text.is_empty() {
        return Incoming::Ignore;
    }

    let bare = text.trim_start_matches(['!', '/']).to_lowercase();
    if text.starts_with(COMMAND_PREFIX) || is_command_name(&bare) {
        return Incoming::Welcome;
    }

    Incoming::Request(text.to_string())
}
