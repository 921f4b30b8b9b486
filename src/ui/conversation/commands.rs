use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::commands::SUGGESTIONS;

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start over with an empty conversation
    Clear,
    /// Write the transcript to a JSON file
    Export,
    /// Load a transcript from a JSON export
    Import,
    /// List the commands from the last reply
    Commands,
    /// Put a starter prompt into the input
    Suggest,
    /// Check whether the assistant is reachable
    Status,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// 1-based suggestion index for `/suggest <n>`
    pub fn suggestion_index(&self) -> Option<usize> {
        if self.command != SlashCommand::Suggest {
            return None;
        }
        self.argument()?.trim().parse().ok()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Clear => "clear the conversation",
            SlashCommand::Export => "export the transcript as JSON (optional directory)",
            SlashCommand::Import => "load a transcript from a JSON export",
            SlashCommand::Commands => "list commands from the last reply",
            SlashCommand::Suggest => "insert a starter prompt (/suggest <n>)",
            SlashCommand::Status => "check the connection to the assistant",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command can run while a reply is pending.
    pub fn available_while_awaiting(self) -> bool {
        !matches!(self, SlashCommand::Import)
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let tail: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "cls" | "reset" => Some(SlashCommand::Clear),
            "save" => Some(SlashCommand::Export),
            "load" | "open" => Some(SlashCommand::Import),
            "cmds" | "copy" => Some(SlashCommand::Commands),
            "ping" => Some(SlashCommand::Status),
            "?" | "h" => Some(SlashCommand::Help),
            _ => None,
        })?;

    let argument = if tail.is_empty() {
        None
    } else {
        Some(tail.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Numbered list of starter prompts
pub fn suggestions_text() -> String {
    let mut text = String::from("Try one of these (/suggest <n>):\n");
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        text.push_str(&format!("  {}. {}\n", i + 1, suggestion));
    }
    text
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nEnter sends, Shift+Enter adds a new line, Ctrl+C quits.");
    help.push_str("\nAliases: /q for /bye, /cls for /clear, /save for /export, /load for /import.");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_arguments() {
        let parsed = parse_slash_command("/export /tmp/chats").unwrap();
        assert_eq!(parsed.command, SlashCommand::Export);
        assert_eq!(parsed.argument(), Some("/tmp/chats"));

        let parsed = parse_slash_command("/clear").unwrap();
        assert_eq!(parsed.command, SlashCommand::Clear);
        assert_eq!(parsed.argument(), None);
    }

    #[test]
    fn resolves_aliases() {
        assert_eq!(parse_slash_command("/q").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("/load x.json").unwrap().command, SlashCommand::Import);
        assert_eq!(parse_slash_command("/cmds").unwrap().command, SlashCommand::Commands);
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_parsed() {
        assert!(parse_slash_command("kubectl get pods").is_none());
        assert!(parse_slash_command("/frobnicate").is_none());
        assert!(parse_slash_command("/").is_none());
    }

    #[test]
    fn suggest_index_is_parsed() {
        assert_eq!(parse_slash_command("/suggest 3").unwrap().suggestion_index(), Some(3));
        assert_eq!(parse_slash_command("/suggest").unwrap().suggestion_index(), None);
        assert_eq!(parse_slash_command("/help 3").unwrap().suggestion_index(), None);
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for entry in command_entries() {
            assert!(help.contains(&format!("/{}", entry.keyword)));
        }
        assert!(suggestions_text().contains("6. docker container optimization"));
    }

    #[test]
    fn import_waits_for_pending_reply() {
        assert!(!SlashCommand::Import.available_while_awaiting());
        assert!(SlashCommand::Clear.available_while_awaiting());
    }
}
