//! Chat commands.

use teloxide::utils::command::{BotCommands, ParseError};

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Register this chat for price alerts")]
    Start,
    #[command(description = "Alert when the price drops to or below a level. Usage: /setlow 0.035")]
    SetLow(String),
    #[command(description = "Alert when the price rises to or above a level. Usage: /sethigh 0.05")]
    SetHigh(String),
    #[command(description = "Show the current price")]
    Price,
    #[command(description = "Show your alert levels")]
    Status,
    #[command(description = "Remove both alert levels")]
    Clear,
    #[command(description = "Show help")]
    Help,
}

impl Command {
    /// Help text listing every command.
    pub fn help_text() -> String {
        Command::descriptions().to_string()
    }
}

/// Classification of an incoming text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A known command with its arguments.
    Command(Command),
    /// A known command word whose arguments could not be parsed.
    BadArguments(String),
    /// Starts with `/` but names no known command.
    Unknown(String),
    /// Plain text, or a command addressed to another bot; ignored.
    NotCommand,
}

/// Parse message text into a command.
///
/// With the bot's username known, `/price@ThisBot` is accepted and
/// `/price@OtherBot` is ignored. Without it every mention suffix is dropped.
pub fn parse_incoming(text: &str, bot_username: Option<&str>) -> Incoming {
    let text = text.trim();
    if !text.starts_with('/') {
        return Incoming::NotCommand;
    }

    let (word, args) = match text.split_once(char::is_whitespace) {
        Some((word, args)) => (word, args.trim()),
        None => (text, ""),
    };
    let name = word.split('@').next().unwrap_or(word);

    let (word, bot_name) = match bot_username {
        Some(username) => (word, username),
        None => (name, ""),
    };
    let normalized = if args.is_empty() {
        word.to_string()
    } else {
        format!("{word} {args}")
    };

    match Command::parse(&normalized, bot_name) {
        Ok(command) => Incoming::Command(command),
        Err(ParseError::WrongBotName(_)) => Incoming::NotCommand,
        Err(_) if is_known_command(name) => Incoming::BadArguments(name.to_string()),
        Err(_) => Incoming::Unknown(name.to_string()),
    }
}

fn is_known_command(word: &str) -> bool {
    let word = word.trim_start_matches('/');
    Command::bot_commands()
        .iter()
        .any(|c| c.command.trim_start_matches('/') == word)
}
