//! Rewindable tokenizer.
//!
//! Tokens are lexed lazily and memoized in an append-only buffer. The parser
//! reads through a separate cursor that it may freely rewind, so backtracking
//! never re-lexes input.

use tracing::error;

/// Read cursor into the token buffer, handed out by [`Tokenizer::position`].
pub type Mark = usize;

/// Outcome of a single recognizer.
enum Lexed {
    Token(String),
    /// Input was consumed without producing a token (`#!command`).
    Nothing,
}

type Recognizer = fn(&mut Tokenizer<'_>) -> Option<Lexed>;

/// Tried top to bottom at every position, first match wins. Specific markers
/// (`#%`, `#:`, `##`) must stay above the bare `#` rule.
const RULES: &[Recognizer] = &[
    whitespace,
    extra_separator,
    command_separator,
    escaped_literal,
    saved_search_marker,
    option_marker,
    operator,
    tag_start,
    terminator,
    tag_chars,
    any_chars,
];

const OPERATORS: [&str; 6] = ["<=", ">=", "!=", "=", "<", ">"];

pub struct Tokenizer<'a> {
    input: &'a str,
    /// Lex cursor, byte offset into `input`. Never moves backwards.
    lexed: usize,
    buffer: Vec<String>,
    /// Read cursor into `buffer`. Always `<= buffer.len()`.
    next: usize,
    extra: Option<String>,
    command: Option<String>,
    fault: Option<usize>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            lexed: 0,
            buffer: Vec::new(),
            next: 0,
            extra: None,
            command: None,
            fault: None,
        }
    }

    /// Returns the next token and advances the read cursor. Once the input is
    /// exhausted this keeps returning an empty string.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> String {
        if self.next == self.buffer.len() && !self.lex_one() {
            return String::new();
        }
        let token = self.buffer[self.next].clone();
        self.next += 1;
        token
    }

    pub fn position(&self) -> Mark {
        self.next
    }

    /// Moves the read cursor back to a previously saved mark. Already lexed
    /// tokens are reused.
    pub fn rewind(&mut self, mark: Mark) {
        debug_assert!(mark <= self.buffer.len());
        self.next = mark;
    }

    /// Untokenized remainder of the input.
    pub fn rest(&self) -> &'a str {
        &self.input[self.lexed..]
    }

    /// Text captured by a `#+` separator.
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// Text captured by a `#!` separator.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Byte offset at which no rule matched, if that ever happened.
    pub fn fault(&self) -> Option<usize> {
        self.fault
    }

    fn lex_one(&mut self) -> bool {
        'position: while self.lexed < self.input.len() {
            for rule in RULES {
                match rule(self) {
                    Some(Lexed::Token(token)) => {
                        self.buffer.push(token);
                        return true;
                    }
                    Some(Lexed::Nothing) => continue 'position,
                    None => {}
                }
            }
            error!(position = self.lexed, input = self.input, "no token rule matched");
            self.fault = Some(self.lexed);
            self.lexed = self.input.len();
        }
        false
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.lexed..]
    }

    fn take(&mut self, len: usize) -> &'a str {
        let taken = &self.input[self.lexed..self.lexed + len];
        self.lexed += len;
        taken
    }

    fn take_prefix(&mut self, prefixes: &[&str]) -> Option<Lexed> {
        let rest = self.remaining();
        let prefix = prefixes.iter().find(|p| rest.starts_with(**p))?;
        Some(Lexed::Token(self.take(prefix.len()).to_string()))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.remaining();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.take(len)
    }
}

/// Characters allowed inside tag names, option names and dates.
pub fn is_tag_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '+' | '-' | '/' | ',' | '_' | ':')
}

fn is_special(ch: char) -> bool {
    matches!(ch, '#' | '@' | '!' | '?' | '<' | '>' | '=')
}

pub fn is_operator(token: &str) -> bool {
    OPERATORS.contains(&token)
}

pub fn is_tag_start(token: &str) -> bool {
    matches!(token, "#" | "@")
}

/// Tokens produced by the two generic runs (tag characters or anything else
/// that is not whitespace), as opposed to markers and operators.
pub fn is_word(token: &str) -> bool {
    let Some(first) = token.chars().next() else {
        return false;
    };
    if first.is_whitespace() {
        return false;
    }
    !is_operator(token)
        && !matches!(
            token,
            "#" | "@" | "#:" | "@:" | "#%" | "@%" | "##" | "@@" | "!" | "?"
        )
}

pub fn is_tag_name(token: &str) -> bool {
    !token.is_empty() && token.chars().all(is_tag_char)
}

fn whitespace(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    let run = t.take_while(char::is_whitespace);
    (!run.is_empty()).then(|| Lexed::Token(" ".to_string()))
}

fn find_command_marker(text: &str) -> Option<usize> {
    match (text.find("#!"), text.find("@!")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn extra_separator(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    let rest = t.remaining();
    if !(rest.starts_with("#+") || rest.starts_with("@+")) {
        return None;
    }
    let body = &rest[2..];
    let end = find_command_marker(body).unwrap_or(body.len());
    let text = body[..end].trim();
    t.take(2 + end);
    match &mut t.extra {
        Some(existing) if !text.is_empty() => {
            existing.push(' ');
            existing.push_str(text);
        }
        Some(_) => {}
        None => t.extra = Some(text.to_string()),
    }
    Some(Lexed::Token(" ".to_string()))
}

fn command_separator(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    let rest = t.remaining();
    if !(rest.starts_with("#!") || rest.starts_with("@!")) {
        return None;
    }
    let command = rest[2..].trim().to_string();
    t.take(rest.len());
    t.command = Some(command);
    Some(Lexed::Nothing)
}

fn escaped_literal(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    t.take_prefix(&["@@", "##"])
}

fn saved_search_marker(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    t.take_prefix(&["#%", "@%"])
}

fn option_marker(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    t.take_prefix(&["#:", "@:"])
}

fn operator(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    t.take_prefix(&OPERATORS)
}

fn tag_start(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    t.take_prefix(&["#", "@"])
}

fn terminator(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    t.take_prefix(&["!", "?"])
}

fn tag_chars(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    let run = t.take_while(is_tag_char);
    (!run.is_empty()).then(|| Lexed::Token(run.to_string()))
}

fn any_chars(t: &mut Tokenizer<'_>) -> Option<Lexed> {
    let first = t.remaining().chars().next()?;
    if first.is_whitespace() {
        return None;
    }
    let start = t.lexed;
    t.lexed += first.len_utf8();
    t.take_while(|c| !c.is_whitespace() && !is_tag_char(c) && !is_special(c));
    Some(Lexed::Token(t.input[start..t.lexed].to_string()))
}
