//! Line parser - Classifies raw input lines and scans mentions
//!
//! Grammar:
//!
//! ```text
//! command := PREFIX word (WS token)? any*
//! mention := '@' word
//! word    := [A-Za-z0-9_]+
//! token   := non-whitespace+
//! ```

/// A classified input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    /// Blank line, ignored
    Empty,
    /// Prefix followed by a keyword and at most one argument
    Command(CommandLine<'a>),
    /// Prefix with no keyword after it
    Malformed,
    /// Anything else is chat content
    Chat(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLine<'a> {
    pub keyword: &'a str,
    pub argument: Option<&'a str>,
}

pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Single-pass cursor over a line
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume characters while `accept` holds; empty if none
    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if accept(c)) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn word(&mut self) -> &'a str {
        self.take_while(is_word_char)
    }

    /// Skip forward to just past the next occurrence of `target`
    fn seek(&mut self, target: char) -> bool {
        while let Some(c) = self.bump() {
            if c == target {
                return true;
            }
        }
        false
    }
}

/// Parses incoming lines into commands or chat content
#[derive(Debug, Clone)]
pub struct LineParser {
    command_prefix: String,
}

impl LineParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn parse<'a>(&self, line: &'a str) -> Input<'a> {
        if line.trim().is_empty() {
            return Input::Empty;
        }

        match line.strip_prefix(self.command_prefix.as_str()) {
            Some(body) if !self.command_prefix.is_empty() => parse_command(body),
            _ => Input::Chat(line),
        }
    }
}

fn parse_command(body: &str) -> Input<'_> {
    let mut scanner = Scanner::new(body);

    let keyword = scanner.word();
    if keyword.is_empty() {
        return Input::Malformed;
    }

    let argument = match scanner.peek() {
        Some(c) if c.is_whitespace() => {
            scanner.bump();
            // Validation of the argument is up to the command.
            Some(scanner.take_while(|c| !c.is_whitespace())).filter(|arg| !arg.is_empty())
        }
        _ => None,
    };

    Input::Command(CommandLine { keyword, argument })
}

/// Names referenced as `@name`, in order of appearance
pub fn mentions(text: &str) -> Vec<&str> {
    let mut scanner = Scanner::new(text);
    let mut names = Vec::new();

    while scanner.seek('@') {
        let name = scanner.word();
        if !name.is_empty() {
            names.push(name);
        }
    }

    names
}
