//! Completion candidates for block types and block bodies

use std::fmt::Write;

use tower_lsp::lsp_types::{MarkupContent, MarkupKind};

use super::blocks::{ConfigBlock, LabelSchema};
use super::tokens::{Pos, Range, Token, TokenKind};
use crate::schema::AttributeSchema;

/// What a candidate inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    BlockType,
    Attribute,
    NestedBlock,
}

/// A suggested insertion at a cursor position
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCandidate {
    pub kind: CandidateKind,
    pub label: String,
    /// The already typed prefix, which the insertion replaces
    pub prefix_range: Range,
    /// Snippet in LSP snippet syntax
    pub snippet: String,
    pub documentation: Option<MarkupContent>,
    pub detail: Option<String>,
}

/// Range covering `prefix` immediately before `pos` on the same line
pub fn prefix_range(prefix: &str, pos: Pos) -> Range {
    let start = Pos {
        line: pos.line,
        column: pos.column.saturating_sub(prefix.chars().count()),
        byte: pos.byte.saturating_sub(prefix.len()),
    };
    Range::new(start, pos)
}

/// The part of the identifier under the cursor that lies before it, or an empty
/// string if the cursor is not at or inside an identifier
pub fn word_before_pos(tokens: &[Token], pos: Pos) -> String {
    tokens
        .iter()
        .find(|t| {
            t.kind == TokenKind::Ident
                && t.range.start.line == pos.line
                && t.range.start.column < pos.column
                && pos.column <= t.range.end.column
        })
        .map(|t| {
            t.text
                .chars()
                .take(pos.column - t.range.start.column)
                .collect()
        })
        .unwrap_or_default()
}

/// Snippet for a whole block, with a tab stop per label
pub fn snippet_for_block(block_type: &str, labels: LabelSchema) -> String {
    let mut snippet = block_type.to_string();
    for (i, label) in labels.iter().enumerate() {
        if label.quoted {
            let _ = write!(snippet, " \"${{{}:{}}}\"", i + 1, label.name);
        } else {
            let _ = write!(snippet, " ${{{}:{}}}", i + 1, label.name);
        }
    }
    snippet.push_str(" {\n}");
    snippet
}

fn snippet_for_attribute(name: &str, attr: &AttributeSchema) -> String {
    let type_name = attr.type_name();
    let value = match type_name.split('(').next().unwrap_or_default() {
        "string" => "\"${1}\"",
        "list" | "set" | "tuple" => "[${1}]",
        "map" | "object" => "{\n  ${1}\n}",
        _ => "${1}",
    };
    format!("{} = {}", name, value)
}

fn snippet_for_nested_block(name: &str) -> String {
    format!("{} {{\n  ${{1}}\n}}", name)
}

/// Brace/bracket depth at `pos`, counting the block's own opening brace
fn nesting_depth(tokens: &[Token], pos: Pos) -> usize {
    let mut depth = 0usize;
    for token in tokens.iter().take_while(|t| t.range.end <= pos) {
        match token.kind {
            TokenKind::OBrace | TokenKind::OBrack | TokenKind::OParen => depth += 1,
            TokenKind::CBrace | TokenKind::CBrack | TokenKind::CParen => {
                depth = depth.saturating_sub(1)
            }
            _ => {}
        }
    }
    depth
}

/// Whether anything other than the word under the cursor precedes it on its line
fn line_has_content_before(tokens: &[Token], pos: Pos, prefix: &str) -> bool {
    let word_start = pos.column.saturating_sub(prefix.chars().count());
    tokens.iter().any(|t| {
        t.kind.is_significant() && t.range.start.line == pos.line && t.range.start.column < word_start
    })
}

impl ConfigBlock {
    /// Attribute and nested block candidates for a cursor inside the body.
    ///
    /// Requires a schema; only offered where a new body item can start, i.e. at
    /// the top nesting level of the body with nothing else before the cursor on
    /// its line.
    pub fn completion_candidates_at_pos(&self, pos: Pos) -> Vec<CompletionCandidate> {
        let Some(schema) = self.schema() else {
            return Vec::new();
        };
        if !self.body_contains(pos) {
            return Vec::new();
        }

        let tokens = self.tokens();
        let prefix = word_before_pos(tokens, pos);
        if nesting_depth(tokens, pos) != 1 || line_has_content_before(tokens, pos, &prefix) {
            return Vec::new();
        }

        let declared: Vec<&str> = self.attributes().iter().map(|a| a.name.as_str()).collect();
        let range = prefix_range(&prefix, pos);
        let mut candidates = Vec::new();

        for (name, attr) in &schema.attributes {
            if attr.is_computed_only() || declared.contains(&name.as_str()) {
                continue;
            }
            if !name.starts_with(&prefix) {
                continue;
            }

            let requirement = if attr.required { "Required" } else { "Optional" };
            candidates.push(CompletionCandidate {
                kind: CandidateKind::Attribute,
                label: name.clone(),
                prefix_range: range,
                snippet: snippet_for_attribute(name, attr),
                documentation: attr.description.as_ref().map(|d| MarkupContent {
                    kind: MarkupKind::PlainText,
                    value: d.clone(),
                }),
                detail: Some(format!("{}, {}", requirement, attr.type_name())),
            });
        }

        for (name, nested) in &schema.block_types {
            if !name.starts_with(&prefix) {
                continue;
            }
            let present = self.nested_blocks().iter().any(|b| &b.name == name);
            if present && nested.max_items == Some(1) {
                continue;
            }

            candidates.push(CompletionCandidate {
                kind: CandidateKind::NestedBlock,
                label: name.clone(),
                prefix_range: range,
                snippet: snippet_for_nested_block(name),
                documentation: nested.block.description.as_ref().map(|d| MarkupContent {
                    kind: MarkupKind::PlainText,
                    value: d.clone(),
                }),
                detail: nested.nesting_mode.as_ref().map(|m| format!("Block, {}", m)),
            });
        }

        candidates
    }
}
