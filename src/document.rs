//! Document state management
//!
//! A [`Document`] holds the text of one open file together with the version the
//! editor last declared for it. Text is only replaced through [`Document::apply`],
//! which either commits a whole change batch or leaves the document untouched.

use ropey::{Rope, RopeSlice};
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

use crate::error::ChangeError;
use crate::parser::{tokenize, Pos, Tokens};

/// Represents the state of an open text document
#[derive(Debug, Clone)]
pub struct Document {
    uri: Url,
    content: Rope,
    version: i32,
}

impl Document {
    /// Create a new document with the version the editor opened it with
    pub fn new(uri: Url, text: &str, version: i32) -> Self {
        Self {
            uri,
            content: Rope::from_str(text),
            version,
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Apply a change batch and move to `version`.
    ///
    /// The batch is applied to a copy of the rope; nothing is committed unless
    /// every change succeeds.
    pub(crate) fn apply(
        &mut self,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<(), ChangeError> {
        self.content = apply_changes(&self.content, changes)?;
        self.version = version;
        Ok(())
    }

    /// Copy out the committed text and version
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            uri: self.uri.clone(),
            text: self.content.to_string(),
            version: self.version,
            content: self.content.clone(),
        }
    }
}

/// A consistent, read-only copy of a document taken under its lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub uri: Url,
    pub text: String,
    pub version: i32,
    content: Rope,
}

impl DocumentSnapshot {
    /// Tokenize the whole text
    pub fn tokens(&self) -> Tokens {
        tokenize(&self.text)
    }

    /// Convert an LSP position (0-based, UTF-16) into a parser position
    pub fn pos_at(&self, position: Position) -> Result<Pos, ChangeError> {
        pos_at(&self.content, position)
    }

    /// Convert a parser position back into an LSP position
    pub fn lsp_position(&self, pos: Pos) -> Position {
        lsp_position(&self.content, pos)
    }
}

/// Apply editor content changes in order.
///
/// Each ranged change is resolved against the text produced by the changes before
/// it. A change without a range replaces the whole text. The input rope is left
/// as it was.
pub fn apply_changes(
    content: &Rope,
    changes: &[TextDocumentContentChangeEvent],
) -> Result<Rope, ChangeError> {
    let mut content = content.clone();

    for change in changes {
        match change.range {
            None => content = Rope::from_str(&change.text),
            Some(range) => {
                let start = char_at(&content, range.start)?;
                let end = char_at(&content, range.end)?;
                if start > end {
                    return Err(ChangeError::InvertedRange);
                }
                content.remove(start..end);
                content.insert(start, &change.text);
            }
        }
    }

    Ok(content)
}

/// Char index of an LSP position.
///
/// The character must fall on a UTF-16 boundary within the line (the line end
/// itself is allowed).
pub fn char_at(content: &Rope, position: Position) -> Result<usize, ChangeError> {
    let out_of_bounds = || ChangeError::PositionOutOfBounds {
        line: position.line,
        character: position.character,
    };

    let line = position.line as usize;
    if line >= content.len_lines() {
        return Err(out_of_bounds());
    }

    let offset = utf16_to_char(line_content(content, line), position.character as usize)
        .ok_or_else(out_of_bounds)?;
    Ok(content.line_to_char(line) + offset)
}

fn pos_at(content: &Rope, position: Position) -> Result<Pos, ChangeError> {
    let char_idx = char_at(content, position)?;
    let line = position.line as usize;

    Ok(Pos {
        line: line + 1,
        column: char_idx - content.line_to_char(line) + 1,
        byte: content.char_to_byte(char_idx),
    })
}

/// LSP position of a parser position, located by its byte offset
pub fn lsp_position(content: &Rope, pos: Pos) -> Position {
    let char_idx = content.byte_to_char(pos.byte.min(content.len_bytes()));
    let line = content.char_to_line(char_idx);
    let character =
        content.char_to_utf16_cu(char_idx) - content.char_to_utf16_cu(content.line_to_char(line));

    Position {
        line: line as u32,
        character: character as u32,
    }
}

/// A line without its terminator
fn line_content(content: &Rope, line: usize) -> RopeSlice<'_> {
    let slice = content.line(line);
    let mut len = slice.len_chars();
    while len > 0 && matches!(slice.char(len - 1), '\n' | '\r') {
        len -= 1;
    }
    slice.slice(..len)
}

/// Char offset of a UTF-16 offset, or `None` past the end or inside a surrogate pair
fn utf16_to_char(line: RopeSlice<'_>, utf16_offset: usize) -> Option<usize> {
    let mut utf16_count = 0;

    for (char_count, ch) in line.chars().enumerate() {
        if utf16_count == utf16_offset {
            return Some(char_count);
        }
        utf16_count += ch.len_utf16();
        if utf16_count > utf16_offset {
            return None;
        }
    }

    (utf16_count == utf16_offset).then(|| line.len_chars())
}
