/// A parsed line from the session prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text, typed at the caret.
    Type(String),
    /// Hover the mouse over prediction offset N.
    Hover(usize),
    /// Mouse click at prediction offset N.
    Click(usize),
    /// Touch tap at prediction offset N.
    Tap(usize),
    /// Touch press at A, drag to B, release.
    Drag(usize, usize),
    Tab,
    Right,
    Escape,
    /// Toggle SELECT mode.
    Select,
    Confirm,
    Show,
    Load(String),
    Save(String),
    Help,
    Quit,
    /// Unknown command or bad arguments.
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Type(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    match (cmd, args.as_slice()) {
        ("hover", [n]) => offset_arg(n).map_or_else(invalid_offset, Command::Hover),
        ("click", [n]) => offset_arg(n).map_or_else(invalid_offset, Command::Click),
        ("tap", [n]) => offset_arg(n).map_or_else(invalid_offset, Command::Tap),
        ("drag", [a, b]) => match (offset_arg(a), offset_arg(b)) {
            (Some(a), Some(b)) => Command::Drag(a, b),
            _ => invalid_offset(),
        },
        ("tab", []) => Command::Tab,
        ("right", []) => Command::Right,
        ("esc", []) => Command::Escape,
        ("select", []) => Command::Select,
        ("confirm", []) => Command::Confirm,
        ("show", []) => Command::Show,
        ("load", [path]) => Command::Load(path.to_string()),
        ("save", [path]) => Command::Save(path.to_string()),
        ("help" | "h", []) => Command::Help,
        ("quit" | "q", []) => Command::Quit,
        _ => Command::Invalid(format!("Unknown command: {line}. Try :help")),
    }
}

fn offset_arg(s: &str) -> Option<usize> {
    s.parse().ok()
}

fn invalid_offset() -> Command {
    Command::Invalid("Offsets are non-negative integers".into())
}

pub fn help_text() -> &'static str {
    "Type text to insert it at the caret. Commands:\n\
     \x20 :hover N       hover the mouse over prediction offset N\n\
     \x20 :click N       click at prediction offset N\n\
     \x20 :tab           accept (Tab)\n\
     \x20 :right         reveal one more char (ArrowRight)\n\
     \x20 :esc           dismiss / leave select mode\n\
     \x20 :select        toggle select mode\n\
     \x20 :tap N         touch tap at offset N\n\
     \x20 :drag A B      touch drag from A to B\n\
     \x20 :confirm       commit the selected range\n\
     \x20 :show          print the document and ghost text\n\
     \x20 :load PATH     replace the document with a file\n\
     \x20 :save PATH     write the document to a file\n\
     \x20 :quit          exit"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_typed() {
        assert_eq!(
            parse_command("The sun was setting"),
            Command::Type("The sun was setting".into())
        );
    }

    #[test]
    fn test_offset_commands() {
        assert_eq!(parse_command(":hover 7"), Command::Hover(7));
        assert_eq!(parse_command(":drag 13 35"), Command::Drag(13, 35));
        assert_eq!(parse_command(":tab"), Command::Tab);
        assert_eq!(parse_command(":save out.txt"), Command::Save("out.txt".into()));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(matches!(parse_command(":click x"), Command::Invalid(_)));
        assert!(matches!(parse_command(":drag 1"), Command::Invalid(_)));
        assert!(matches!(parse_command(":nope"), Command::Invalid(_)));
    }
}
