//! Trainer commands, the command-line parser and hotkeys

use std::collections::HashMap;

/// Key sequence type
pub type KeySequence = Vec<u8>;

/// A user request; phrase and voice numbers are 0-based here
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(String),
    List,
    Say(usize),
    Delete(usize),
    PlayAll,
    /// Pause one phrase, or everything when no number is given
    Pause(Option<usize>),
    Resume(Option<usize>),
    /// Pause when speaking, resume when paused
    TogglePause,
    Stop,
    Clear,
    /// Show the rate, or set it
    Rate(Option<f32>),
    Voices,
    Voice(usize),
    Help,
    Quit,
}

/// One line of help per command
pub const HELP: &[&str] = &[
    "add <text>     add a phrase (any other text is added as typed)",
    "list           show all phrases",
    "say <n>        speak phrase n",
    "del <n>        delete phrase n",
    "all            speak every phrase in order",
    "pause [n]      pause phrase n, or everything",
    "resume [n]     resume phrase n, or everything",
    "stop           stop speaking",
    "clear          delete all phrases",
    "rate [x]       show or set speech rate (0.1 - 2.0)",
    "voices         list available voices",
    "voice <n>      use voice n",
    "help           show this help",
    "quit           exit",
    "Keys: Esc stop, Ctrl-P pause/resume, Ctrl-A play all, Ctrl-C quit",
];

/// Read a 1-based number typed by the user as a 0-based index
///
/// Returns `None` when the argument is not a number at all, so the caller
/// can treat the line as phrase text instead.
fn index_arg(arg: &str) -> Option<Result<usize, String>> {
    let n = arg.parse::<usize>().ok()?;
    Some(match n {
        0 => Err(format!("Not a phrase number: {}", arg)),
        n => Ok(n - 1),
    })
}

/// Parse one command line
///
/// A command word only counts when its arguments have the expected shape:
/// bare words for commands without arguments, a number for `say`, `del`,
/// `pause`, `resume` and `voice`, a decimal for `rate`. Anything else is
/// added as a phrase exactly as typed, so "Play the guitar" or "Stop it
/// please" are phrases, not commands. `add <text>` always adds.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let word = word.to_lowercase();
    let phrase = || Command::Add(line.to_string());

    let command = match (word.as_str(), rest) {
        ("add", _) => Command::Add(rest.to_string()),
        ("list" | "ls", "") => Command::List,
        ("all" | "play", "") => Command::PlayAll,
        ("stop", "") => Command::Stop,
        ("clear", "") => Command::Clear,
        ("voices", "") => Command::Voices,
        ("help" | "?", "") => Command::Help,
        ("quit" | "exit", "") => Command::Quit,
        ("pause", "") => Command::Pause(None),
        ("resume", "") => Command::Resume(None),
        ("rate", "") => Command::Rate(None),
        ("say" | "del" | "delete" | "rm" | "voice", "") => {
            let usage = if word == "say" || word == "voice" { word.as_str() } else { "del" };
            return Err(format!("Usage: {} <n>", usage));
        }
        ("say", arg) => match index_arg(arg) {
            Some(index) => Command::Say(index?),
            None => phrase(),
        },
        ("del" | "delete" | "rm", arg) => match index_arg(arg) {
            Some(index) => Command::Delete(index?),
            None => phrase(),
        },
        ("voice", arg) => match index_arg(arg) {
            Some(index) => Command::Voice(index?),
            None => phrase(),
        },
        ("pause", arg) => match index_arg(arg) {
            Some(index) => Command::Pause(Some(index?)),
            None => phrase(),
        },
        ("resume", arg) => match index_arg(arg) {
            Some(index) => Command::Resume(Some(index?)),
            None => phrase(),
        },
        ("rate", arg) => match arg.parse::<f32>() {
            Ok(rate) if rate.is_finite() => Command::Rate(Some(rate)),
            _ => phrase(),
        },
        _ => phrase(),
    };
    Ok(command)
}

/// Create the default hotkeys
pub fn create_default_keymap() -> HashMap<KeySequence, Command> {
    let mut map = HashMap::new();

    map.insert(b"\x1b".to_vec(), Command::Stop); // Esc
    map.insert(b"\x10".to_vec(), Command::TogglePause); // Ctrl-P
    map.insert(b"\x01".to_vec(), Command::PlayAll); // Ctrl-A
    map.insert(b"\x03".to_vec(), Command::Quit); // Ctrl-C

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn added(text: &str) -> Result<Command, String> {
        Ok(Command::Add(text.to_string()))
    }

    #[test]
    fn test_numbers_are_one_based() {
        assert_eq!(parse_command("say 1"), Ok(Command::Say(0)));
        assert_eq!(parse_command("del 3"), Ok(Command::Delete(2)));
        assert_eq!(parse_command("voice 2"), Ok(Command::Voice(1)));
        assert_eq!(parse_command("say 0"), Err("Not a phrase number: 0".to_string()));
        assert_eq!(parse_command("del"), Err("Usage: del <n>".to_string()));
        assert_eq!(parse_command("say"), Err("Usage: say <n>".to_string()));
    }

    #[test]
    fn test_optional_arguments() {
        assert_eq!(parse_command("pause"), Ok(Command::Pause(None)));
        assert_eq!(parse_command("pause 2"), Ok(Command::Pause(Some(1))));
        assert_eq!(parse_command("resume"), Ok(Command::Resume(None)));
        assert_eq!(parse_command("rate"), Ok(Command::Rate(None)));
        assert_eq!(parse_command("rate 1.5"), Ok(Command::Rate(Some(1.5))));
    }

    #[test]
    fn test_add_keeps_text() {
        assert_eq!(parse_command("add  Good   morning "), added("Good   morning"));
        assert_eq!(parse_command("add"), added(""));
        assert_eq!(parse_command("add quit"), added("quit"));
    }

    #[test]
    fn test_plain_text_is_added() {
        assert_eq!(parse_command("Where is the station?"), added("Where is the station?"));
    }

    #[test]
    fn test_phrases_starting_with_command_words() {
        for line in [
            "A little bit",
            "Play the guitar",
            "All right then",
            "Quit smoking",
            "Stop it please",
            "Clear the table",
            "List your names",
            "Help me",
            "Say hello",
            "Delete that photo",
            "Voice your concerns",
            "Pause for effect",
            "Resume the game",
            "Rate the movie",
            "say 1 more time",
            "rate 1.5 stars",
        ] {
            assert_eq!(parse_command(line), added(line), "{}", line);
        }
    }

    #[test]
    fn test_command_words_ignore_case() {
        assert_eq!(parse_command("ALL"), Ok(Command::PlayAll));
        assert_eq!(parse_command("Quit"), Ok(Command::Quit));
        assert_eq!(parse_command("Say 2"), Ok(Command::Say(1)));
    }

    #[test]
    fn test_default_keymap() {
        let map = create_default_keymap();
        assert_eq!(map.get(b"\x1b".as_slice()), Some(&Command::Stop));
        assert_eq!(map.get(b"\x10".as_slice()), Some(&Command::TogglePause));
        assert_eq!(map.get(b"\x01".as_slice()), Some(&Command::PlayAll));
    }
}
