//! Tokenizer for the Terraform native syntax
//!
//! This is not a validating lexer. It recognises just enough of the language to
//! find block boundaries: identifiers, quoted templates (including nested `${...}`
//! and `%{...}` sequences), heredocs, numbers, comments and punctuation. Anything
//! unexpected becomes an [`TokenKind::Other`] token instead of an error, so a
//! half-typed document still tokenizes completely.

use std::ops::Deref;

/// A position in the source. Line and column are 1-based, column counts characters.
///
/// Positions order by line, then column, then byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

impl Pos {
    /// The first position of any document
    pub const INITIAL: Pos = Pos {
        line: 1,
        column: 1,
        byte: 0,
    };

    pub fn new(line: usize, column: usize, byte: usize) -> Self {
        Self { line, column, byte }
    }
}

/// A half-open source range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Pos,
    pub end: Pos,
}

impl Range {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// Whether `pos` lies within the range, counting the end position as inside
    pub fn contains_pos(&self, pos: Pos) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// The kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// A quoted template, quotes included in the token text
    QuotedLit,
    NumberLit,
    Heredoc,
    OBrace,
    CBrace,
    OBrack,
    CBrack,
    OParen,
    CParen,
    Equal,
    Comma,
    Dot,
    Colon,
    Newline,
    Comment,
    /// Operators and characters the tokenizer does not classify further
    Other,
    Eof,
}

impl TokenKind {
    /// Whether the token carries meaning for block structure
    pub fn is_significant(self) -> bool {
        !matches!(self, TokenKind::Newline | TokenKind::Comment | TokenKind::Eof)
    }
}

/// A single lexical token with its source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub range: Range,
}

impl Token {
    /// Text of a quoted literal without its quotes and with escapes resolved,
    /// or the raw text for any other token
    pub fn value(&self) -> String {
        match self.kind {
            TokenKind::QuotedLit => unquote(&self.text),
            _ => self.text.clone(),
        }
    }
}

/// An ordered token stream, always terminated by an EOF token
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokens(Vec<Token>);

impl Tokens {
    /// Whether the stream contains anything besides layout and EOF
    pub fn has_significant(&self) -> bool {
        self.0.iter().any(|t| t.kind.is_significant())
    }

    /// Copy of a sub-slice as a stream of its own
    pub fn slice(&self, range: std::ops::Range<usize>) -> Tokens {
        Tokens(self.0[range].to_vec())
    }
}

impl Deref for Tokens {
    type Target = [Token];

    fn deref(&self) -> &[Token] {
        &self.0
    }
}

/// Tokenize a complete document
pub fn tokenize(src: &str) -> Tokens {
    Lexer::new(src).run()
}

struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: Pos::INITIAL.line,
            column: Pos::INITIAL.column,
            tokens: Vec::new(),
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
            byte: self.offset,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.offset..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn push(&mut self, kind: TokenKind, start: Pos, start_offset: usize) {
        let text = self.src[start_offset..self.offset].to_string();
        let range = Range::new(start, self.pos());
        self.tokens.push(Token { kind, text, range });
    }

    fn run(mut self) -> Tokens {
        while let Some(ch) = self.peek() {
            let start = self.pos();
            let start_offset = self.offset;

            let kind = match ch {
                ' ' | '\t' | '\r' => {
                    self.bump();
                    continue;
                }
                '\n' => {
                    self.bump();
                    TokenKind::Newline
                }
                '#' => {
                    self.bump_while(|c| c != '\n');
                    TokenKind::Comment
                }
                '/' if self.peek_nth(1) == Some('/') => {
                    self.bump_while(|c| c != '\n');
                    TokenKind::Comment
                }
                '/' if self.peek_nth(1) == Some('*') => {
                    self.block_comment();
                    TokenKind::Comment
                }
                '"' => {
                    self.quoted();
                    TokenKind::QuotedLit
                }
                '<' if self.peek_nth(1) == Some('<') && self.heredoc() => TokenKind::Heredoc,
                c if is_ident_start(c) => {
                    self.bump_while(is_ident_continue);
                    TokenKind::Ident
                }
                c if c.is_ascii_digit() => {
                    self.number();
                    TokenKind::NumberLit
                }
                '{' => self.single(TokenKind::OBrace),
                '}' => self.single(TokenKind::CBrace),
                '[' => self.single(TokenKind::OBrack),
                ']' => self.single(TokenKind::CBrack),
                '(' => self.single(TokenKind::OParen),
                ')' => self.single(TokenKind::CParen),
                ',' => self.single(TokenKind::Comma),
                '.' => self.single(TokenKind::Dot),
                ':' => self.single(TokenKind::Colon),
                '=' if !matches!(self.peek_nth(1), Some('=') | Some('>')) => {
                    self.single(TokenKind::Equal)
                }
                _ => {
                    self.operator();
                    TokenKind::Other
                }
            };

            self.push(kind, start, start_offset);
        }

        let eof = self.pos();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            range: Range::new(eof, eof),
        });

        Tokens(self.tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn operator(&mut self) {
        let first = self.bump();
        let second = self.peek();
        let pair = matches!(
            (first, second),
            (Some('='), Some('='))
                | (Some('='), Some('>'))
                | (Some('!'), Some('='))
                | (Some('<'), Some('='))
                | (Some('>'), Some('='))
                | (Some('&'), Some('&'))
                | (Some('|'), Some('|'))
        );
        if pair {
            self.bump();
        }
    }

    fn number(&mut self) {
        self.bump_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.bump_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let digit_at = if matches!(self.peek_nth(1), Some('+') | Some('-')) {
                2
            } else {
                1
            };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                self.bump_while(|c| c.is_ascii_digit());
            }
        }
    }

    fn block_comment(&mut self) {
        self.bump();
        self.bump();
        while let Some(ch) = self.bump() {
            if ch == '*' && self.peek() == Some('/') {
                self.bump();
                return;
            }
        }
    }

    /// Consume a quoted template. An unterminated quote ends at the line end.
    fn quoted(&mut self) {
        self.bump();
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => return,
                '\\' => {
                    self.bump();
                    if self.peek() != Some('\n') {
                        self.bump();
                    }
                }
                '"' => {
                    self.bump();
                    return;
                }
                '$' | '%' if self.peek_nth(1) == Some('{') => {
                    self.bump();
                    self.template_sequence();
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Consume a `{...}` interpolation body, honouring nested braces and strings.
    /// An interpolation left open ends at the line end.
    fn template_sequence(&mut self) {
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                '{' => {
                    depth += 1;
                    self.bump();
                }
                '}' => {
                    self.bump();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                '"' => self.quoted(),
                '\n' => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Consume `<<ID` or `<<-ID` up to the closing marker line. Returns false,
    /// consuming nothing, if this is not a heredoc introducer.
    fn heredoc(&mut self) -> bool {
        let rest = &self.src[self.offset..];
        let after = rest.strip_prefix("<<").unwrap_or(rest);
        let after = after.strip_prefix('-').unwrap_or(after);

        let marker: String = after
            .chars()
            .take_while(|c| is_ident_continue(*c))
            .collect();
        if marker.is_empty() || !marker.starts_with(is_ident_start) {
            return false;
        }
        let header_len = rest.len() - after.len() + marker.len();
        if !rest[header_len..].starts_with('\n') && !rest[header_len..].starts_with("\r\n") {
            return false;
        }

        let header_end = self.offset + header_len;
        while self.offset < header_end {
            self.bump();
        }
        self.bump_while(|c| c != '\n');

        // Each iteration starts at the newline ending the previous line
        while self.bump().is_some() {
            let line_start = self.offset;
            self.bump_while(|c| c != '\n');
            if self.src[line_start..self.offset].trim() == marker {
                return true;
            }
        }
        true
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn unquote(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
