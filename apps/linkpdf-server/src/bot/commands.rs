//! Slash-command parsing

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `/name`, optional `@botname` suffix, optional argument tail
    static ref COMMAND_PATTERN: Regex =
        Regex::new(r"(?s)^/([A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s+(.*))?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    AddUser(Option<String>),
    RemoveUser(Option<String>),
    ListUsers,
    Stats,
    Unknown(String),
}

impl Command {
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Command::AddUser(_) | Command::RemoveUser(_) | Command::ListUsers | Command::Stats
        )
    }
}

/// `None` when the text is not a command at all
pub fn parse_command(text: &str) -> Option<Command> {
    let caps = COMMAND_PATTERN.captures(text.trim())?;
    let name = caps.get(1)?.as_str().to_ascii_lowercase();
    let arg = caps
        .get(2)
        .and_then(|m| m.as_str().split_whitespace().next())
        .map(str::to_string);

    let command = match name.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "cancel" => Command::Cancel,
        "add_user" => Command::AddUser(arg),
        "remove_user" => Command::RemoveUser(arg),
        "list_users" => Command::ListUsers,
        "stats" => Command::Stats,
        _ => Command::Unknown(name),
    };
    Some(command)
}
