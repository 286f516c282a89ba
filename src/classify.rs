//! Chat message classification.
//!
//! Splits raw chat text into moderator commands (`!name args...`) and
//! regular messages. Every input classifies successfully; a bare `!` is
//! treated as plain text rather than a degenerate command.

/// Marker a message must start with to be considered a command.
const COMMAND_MARKER: char = '!';

/// A chat message sorted into command or regular text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Plain chat text. Carries the full original text.
    Regular { text: String },
    /// A `!command`. The name is lowercased; args are everything after the
    /// first space, trimmed (empty when the command has no arguments).
    Command { name: String, args: String },
}

/// Classify one raw chat message. Pure — no side effects, no failure cases.
pub fn classify(text: &str) -> Classified {
    if !text.starts_with(COMMAND_MARKER) || text.len() == 1 {
        return Classified::Regular {
            text: text.to_owned(),
        };
    }

    let body = &text[1..];
    match body.find(' ') {
        Some(pos) => Classified::Command {
            name: body[..pos].trim_end().to_lowercase(),
            args: body[pos + 1..].trim().to_owned(),
        },
        None => Classified::Command {
            name: body.trim_end().to_lowercase(),
            args: String::new(),
        },
    }
}
