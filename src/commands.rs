//! Chat command parsing. Commands are recognized in any channel, before the
//! Han-content trigger.

pub const COMMAND_PREFIX: &str = "!pinyin";

pub const HELP_TEXT: &str = "\
**hancard** turns Chinese lines into pinyin + translation cards.

Send Chinese text in an enabled channel and each line comes back as an image.

Commands:
  !pinyin on            enable this channel
  !pinyin off           disable this channel
  !pinyin status        show whether this channel is enabled
  !pinyin test <text>   render the given Chinese text here
  !pinyin help          this message

Example: send 你好世界 and get its pinyin and translation back.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Enable,
    Disable,
    Test(String),
}

/// Parses `content` as a command. Returns `None` for ordinary messages;
/// unknown subcommands fold into `Help` so the user always gets an answer.
pub fn parse(content: &str) -> Option<Command> {
    let trimmed = content.trim();
    let rest = trimmed.strip_prefix(COMMAND_PREFIX)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    let (word, remainder) = match rest.split_once(char::is_whitespace) {
        Some((word, remainder)) => (word, remainder.trim()),
        None => (rest, ""),
    };
    let command = match word {
        "" | "help" => Command::Help,
        "status" => Command::Status,
        "on" => Command::Enable,
        "off" => Command::Disable,
        "test" => Command::Test(remainder.to_string()),
        _ => Command::Help,
    };
    Some(command)
}
