use crate::components::Assistant;
use crate::config::Config;
use crate::error::BotResult;
use std::fmt;
use std::sync::Arc;

// Export submodules
pub mod util;

/// Prefix for text commands, messages starting with it are not booking requests
pub const COMMAND_PREFIX: &str = "!";

/// Names of the registered commands
pub const COMMAND_NAMES: &[&str] = &["start", "help"];

/// Shared context for all commands and event handlers
pub struct CommandContext {
    pub config: Arc<Config>,
    pub assistant: Arc<Assistant>,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config: Arc<Config>, assistant: Arc<Assistant>) -> Self {
        Self { config, assistant }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("calendar_id", &self.config.calendar_id)
            .field("timezone", &self.config.timezone)
            .finish()
    }
}

/// Type alias for command result
pub type CommandResult = BotResult<()>;

/// Type alias for poise context
pub type Context<'a> = poise::Context<'a, CommandContext, crate::error::Error>;

/// All application commands
pub fn get_all_application_commands() -> Vec<poise::Command<CommandContext, crate::error::Error>> {
    vec![util::start(), util::help()]
}

/// Whether `word` names one of the registered commands
pub fn is_command_name(word: &str) -> bool {
    COMMAND_NAMES.contains(&word)
}
