//! Slash-command parsing.

/// A `/command[@target] [args...]` message, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Command name, alphanumerics only.
    pub name: String,
    /// The `@botname` suffix including the `@`, if present.
    pub target: Option<String>,
    /// Whitespace-delimited arguments; `None` when there are none.
    pub args: Option<Vec<String>>,
}

/// Parse a message text as a slash command.
///
/// Returns `None` when the text does not start with `/` or when nothing
/// alphanumeric is left of the name. Non-alphanumeric characters in the
/// name are dropped, not rejected: `/re-start!` is `restart`.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let rest = text.strip_prefix('/')?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut tokens = rest.split_whitespace();
    let head = tokens.next()?;

    let (raw_name, target) = match head.split_once('@') {
        Some((name, target)) if !target.is_empty() => (name, Some(format!("@{target}"))),
        Some((name, _)) => (name, None),
        None => (head, None),
    };

    let name: String = raw_name.chars().filter(|c| c.is_alphanumeric()).collect();
    if name.is_empty() {
        return None;
    }

    let args: Vec<String> = tokens.map(str::to_string).collect();

    Some(ParsedCommand {
        name,
        target,
        args: if args.is_empty() { None } else { Some(args) },
    })
}
