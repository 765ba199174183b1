//! Parser module for Terraform configuration blocks
//!
//! Parsing is deliberately forgiving. Requests arrive while the user is typing,
//! so the document is usually incomplete; a block only fails to parse when its
//! type is unknown or its factory rejects it for a structural reason.

mod blocks;
mod completion;
mod extract;
mod tokens;

use std::sync::Arc;

pub use blocks::{
    BlockFactory, BlockFactoryRegistry, BlockType, ConfigBlock, Label, LabelDescriptor,
    LabelSchema,
};
pub use completion::{
    prefix_range, snippet_for_block, word_before_pos, CandidateKind, CompletionCandidate,
};
pub use extract::{block_at_pos, extract_block, split_blocks, BlockSkeleton, BodyItem, RawLabel};
pub use tokens::{tokenize, Pos, Range, Token, TokenKind, Tokens};

use crate::error::{Error, Result};
use crate::schema::SchemaReader;

/// Block parser bound to a schema reader.
///
/// Holds no per-request state, so a fresh instance can be acquired for every
/// request (see [`crate::version::find_compatible_parser`]).
#[derive(Debug)]
pub struct Parser {
    registry: BlockFactoryRegistry,
}

impl Parser {
    pub(crate) fn new(schema_reader: Option<Arc<dyn SchemaReader>>) -> Self {
        Self {
            registry: BlockFactoryRegistry::new(schema_reader),
        }
    }

    pub fn registry(&self) -> &BlockFactoryRegistry {
        &self.registry
    }

    /// Parse the block at the start of `tokens` into a typed block.
    ///
    /// Syntax problems in the rest of the tokens are ignored; only an unknown
    /// block type or a factory rejection is reported.
    pub fn parse_block_from_tokens(&self, tokens: &Tokens) -> Result<ConfigBlock> {
        if tokens.is_empty() || !tokens.has_significant() {
            return Err(Error::EmptyInput);
        }

        let keyword = extract_block(tokens).keyword;
        tracing::debug!("Parsed block type: {:?}", keyword);

        let Some(factory) = self.registry.get(&keyword) else {
            return Err(Error::UnknownBlockType { keyword });
        };

        factory
            .build(tokens)
            .map_err(|cause| Error::FactoryRejected { keyword, cause })
    }

    /// Block types whose keyword starts with the word before `pos`
    pub fn block_type_candidates(&self, tokens: &Tokens, pos: Pos) -> Vec<CompletionCandidate> {
        let prefix = word_before_pos(tokens, pos);
        let range = prefix_range(&prefix, pos);

        self.registry
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, factory)| CompletionCandidate {
                kind: CandidateKind::BlockType,
                label: name.to_string(),
                prefix_range: range,
                snippet: snippet_for_block(name, factory.label_schema()),
                documentation: Some(factory.documentation()),
                detail: None,
            })
            .collect()
    }

    /// Candidates for a cursor anywhere in a document.
    ///
    /// Outside any block, or on a keyword that has nothing after it yet, block
    /// types are offered. Inside a block body, attributes and nested blocks from
    /// the schema are. The keyword of a block that already has labels or a body
    /// gets nothing, since a block snippet would duplicate the header.
    pub fn candidates_at_pos(&self, tokens: &Tokens, pos: Pos) -> Vec<CompletionCandidate> {
        let Some(block_tokens) = block_at_pos(tokens, pos) else {
            return self.block_type_candidates(tokens, pos);
        };

        let skeleton = extract_block(&block_tokens);
        if skeleton.keyword_range.contains_pos(pos) {
            if skeleton.labels.is_empty() && skeleton.open_brace.is_none() {
                return self.block_type_candidates(&block_tokens, pos);
            }
            return Vec::new();
        }
        if !skeleton.body_contains(pos) {
            return Vec::new();
        }

        match self.parse_block_from_tokens(&block_tokens) {
            Ok(block) => block.completion_candidates_at_pos(pos),
            Err(err) => {
                tracing::debug!(error = %err, "no body completion");
                Vec::new()
            }
        }
    }
}
