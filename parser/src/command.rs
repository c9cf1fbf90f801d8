//! The close/reopen command parser.
//!
//! Commands are not addressed to the bot by name; a command is recognized
//! when it stands alone on a line of the comment, matched case-insensitively.
//! Anything else on the same line disqualifies it.
//!
//! The grammar is as follows:
//!
//! ```text
//! Command: `/close`, or `/reopen`.
//! ```

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?im)^/close\s*$").unwrap());
static REOPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?im)^/reopen\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Close,
    Reopen,
}

impl Command {
    /// Whether `comment` contains this command on a line of its own.
    pub fn matches(&self, comment: &str) -> bool {
        match self {
            Command::Close => CLOSE.is_match(comment),
            Command::Reopen => REOPEN.is_match(comment),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Command::Close => "close",
            Command::Reopen => "reopen",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_alone_on_a_line() {
        assert!(Command::Close.matches("/close"));
        assert!(Command::Reopen.matches("/reopen"));
    }

    #[test]
    fn case_insensitive() {
        assert!(Command::Close.matches("/CLOSE"));
        assert!(Command::Reopen.matches("/Reopen"));
    }

    #[test]
    fn trailing_whitespace_is_tolerated() {
        assert!(Command::Close.matches("/close   "));
        assert!(Command::Close.matches("/close\t"));
    }

    #[test]
    fn extra_text_disqualifies_the_line() {
        assert!(!Command::Close.matches("/close please"));
        assert!(!Command::Reopen.matches("/reopen it"));
        assert!(!Command::Close.matches("you can /close this"));
    }

    #[test]
    fn any_line_of_the_comment_counts() {
        assert!(Command::Close.matches("done in #42\n/close\nthanks!"));
        assert!(!Command::Close.matches("done in #42, /close\nthanks!"));
    }

    #[test]
    fn commands_do_not_match_each_other() {
        assert!(!Command::Reopen.matches("/close"));
        assert!(!Command::Close.matches("/reopen"));
    }

    #[test]
    fn display_is_the_verb() {
        assert_eq!(Command::Close.to_string(), "close");
        assert_eq!(Command::Reopen.to_string(), "reopen");
    }
}
