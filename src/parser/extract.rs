//! Lenient block extraction
//!
//! The extractor never fails. Given any token stream it returns its best guess at
//! a block: the leading keyword, the labels that follow it, and the body between
//! braces when there is one. Missing closing braces, stray tokens and unfinished
//! strings are all tolerated; strict checks belong to the block factories.

use super::tokens::{Pos, Range, Token, TokenKind, Tokens};

/// A label as written in a block header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLabel {
    pub value: String,
    pub quoted: bool,
    pub range: Range,
}

/// An attribute or nested block name found directly inside a block body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyItem {
    pub name: String,
    pub range: Range,
}

/// The structural outline of one block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockSkeleton {
    /// Text of the first significant token, usually the block type
    pub keyword: String,
    pub keyword_range: Range,
    pub labels: Vec<RawLabel>,
    /// A header token that is neither a label nor the opening brace
    pub unexpected: Option<Token>,
    pub open_brace: Option<Range>,
    /// `None` while the body is still being typed
    pub close_brace: Option<Range>,
    pub attributes: Vec<BodyItem>,
    pub nested_blocks: Vec<BodyItem>,
    pub range: Range,
}

impl BlockSkeleton {
    /// Whether `pos` is inside the braces of the body
    pub fn body_contains(&self, pos: Pos) -> bool {
        let Some(open) = self.open_brace else {
            return false;
        };
        if pos < open.end {
            return false;
        }
        match self.close_brace {
            Some(close) => pos <= close.start,
            None => true,
        }
    }
}

/// Outline the block that starts at the first significant token
pub fn extract_block(tokens: &[Token]) -> BlockSkeleton {
    let mut skeleton = BlockSkeleton::default();
    let mut iter = tokens
        .iter()
        .enumerate()
        .skip_while(|(_, t)| !t.kind.is_significant() && t.kind != TokenKind::Eof);

    let Some((_, first)) = iter.next() else {
        return skeleton;
    };
    skeleton.keyword = first.text.clone();
    skeleton.keyword_range = first.range;
    skeleton.range = first.range;
    if first.kind == TokenKind::Eof {
        return skeleton;
    }

    let mut body_start = None;
    for (idx, token) in iter.by_ref() {
        match token.kind {
            TokenKind::QuotedLit | TokenKind::Ident => skeleton.labels.push(RawLabel {
                value: token.value(),
                quoted: token.kind == TokenKind::QuotedLit,
                range: token.range,
            }),
            TokenKind::Comment => {}
            TokenKind::OBrace => {
                skeleton.open_brace = Some(token.range);
                body_start = Some(idx + 1);
                break;
            }
            TokenKind::Newline | TokenKind::Eof => {
                skeleton.range.end = token.range.start;
                break;
            }
            _ => {
                skeleton.range.end = token.range.start;
                skeleton.unexpected = Some(token.clone());
                break;
            }
        }
        skeleton.range.end = token.range.end;
    }

    if let Some(start) = body_start {
        scan_body(&tokens[start..], &mut skeleton);
    }

    skeleton
}

fn scan_body(tokens: &[Token], skeleton: &mut BlockSkeleton) {
    let mut depth = 1usize;
    let mut line_start = true;
    let mut end = skeleton.open_brace.map(|r| r.end).unwrap_or_default();

    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect();

    for (i, token) in significant.iter().enumerate() {
        if token.kind != TokenKind::Eof {
            end = token.range.end;
        }

        match token.kind {
            TokenKind::OBrace | TokenKind::OBrack | TokenKind::OParen => depth += 1,
            TokenKind::CBrack | TokenKind::CParen => depth = depth.saturating_sub(1).max(1),
            TokenKind::CBrace => {
                depth -= 1;
                if depth == 0 {
                    skeleton.close_brace = Some(token.range);
                    break;
                }
            }
            TokenKind::Ident if depth == 1 && line_start => {
                let next = significant.get(i + 1).map(|t| t.kind);
                let item = BodyItem {
                    name: token.text.clone(),
                    range: token.range,
                };
                match next {
                    Some(TokenKind::Equal) => skeleton.attributes.push(item),
                    Some(TokenKind::OBrace) | Some(TokenKind::QuotedLit) => {
                        skeleton.nested_blocks.push(item)
                    }
                    _ => {}
                }
            }
            _ => {}
        }

        line_start = matches!(token.kind, TokenKind::Newline | TokenKind::OBrace);
    }

    skeleton.range.end = end;
}

/// Split a document's tokens into the index ranges of its top-level blocks.
///
/// A block runs from its first significant token to its matching closing brace.
/// A header that ends at a newline before any brace is a block of its own, and a
/// block whose body is never closed runs to the end of input, EOF included.
pub fn split_blocks(tokens: &[Token]) -> Vec<std::ops::Range<usize>> {
    let mut blocks = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth = 0usize;
    let mut seen_brace = false;

    for (idx, token) in tokens.iter().enumerate() {
        let Some(begin) = start else {
            if token.kind.is_significant() {
                start = Some(idx);
                if token.kind == TokenKind::OBrace {
                    depth = 1;
                    seen_brace = true;
                }
            }
            continue;
        };

        match token.kind {
            TokenKind::Eof => {
                blocks.push(begin..idx + 1);
                start = None;
            }
            TokenKind::Newline if depth == 0 && !seen_brace => {
                blocks.push(begin..idx);
                start = None;
            }
            TokenKind::OBrace => {
                depth += 1;
                seen_brace = true;
            }
            TokenKind::CBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 && seen_brace {
                    blocks.push(begin..idx + 1);
                    start = None;
                }
            }
            _ => {}
        }

        if start.is_none() {
            depth = 0;
            seen_brace = false;
        }
    }

    blocks
}

/// Locate the top-level block whose extent covers `pos`
pub fn block_at_pos(tokens: &Tokens, pos: Pos) -> Option<Tokens> {
    split_blocks(tokens).into_iter().find_map(|span| {
        let first = tokens.get(span.start)?;
        let last = tokens.get(span.end.checked_sub(1)?)?;
        Range::new(first.range.start, last.range.end)
            .contains_pos(pos)
            .then(|| tokens.slice(span))
    })
}
