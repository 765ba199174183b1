//! Typed configuration blocks and the factories that build them
//!
//! Every supported block type has a [`BlockFactory`] registered under its
//! keyword. The factory knows the label grammar of its block, carries the
//! documentation shown in completion, and is the only way to obtain a
//! [`ConfigBlock`] of that type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tower_lsp::lsp_types::{MarkupContent, MarkupKind};

use super::extract::{extract_block, BlockSkeleton, BodyItem};
use super::tokens::{Pos, Range, Tokens};
use crate::error::BlockError;
use crate::schema::{BlockSchema, SchemaReader};

/// The block types this parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Provider,
    Resource,
    DataSource,
}

impl BlockType {
    pub const ALL: [BlockType; 3] = [
        BlockType::Provider,
        BlockType::Resource,
        BlockType::DataSource,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            BlockType::Provider => "provider",
            BlockType::Resource => "resource",
            BlockType::DataSource => "data",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One positional label in a block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelDescriptor {
    pub name: &'static str,
    /// Whether the label is written as a quoted string
    pub quoted: bool,
}

pub type LabelSchema = &'static [LabelDescriptor];

const PROVIDER_LABELS: LabelSchema = &[LabelDescriptor {
    name: "name",
    quoted: true,
}];

const RESOURCE_LABELS: LabelSchema = &[
    LabelDescriptor {
        name: "type",
        quoted: true,
    },
    LabelDescriptor {
        name: "name",
        quoted: true,
    },
];

/// A label value paired with the descriptor it fills
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: &'static str,
    pub value: String,
    pub range: Range,
}

/// A parsed top-level block
#[derive(Debug, Clone)]
pub struct ConfigBlock {
    block_type: BlockType,
    labels: Vec<Label>,
    schema: Option<BlockSchema>,
    skeleton: BlockSkeleton,
    tokens: Tokens,
}

impl ConfigBlock {
    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// Labels in header order. May be shorter than the label schema while the
    /// header is still being typed.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    /// Address of the block, e.g. `aws_instance.web` or `data.aws_ami.ubuntu`.
    /// `None` until every label is present.
    pub fn name(&self) -> Option<String> {
        match self.block_type {
            BlockType::Provider => self.label("name").map(str::to_string),
            BlockType::Resource => Some(format!(
                "{}.{}",
                self.label("type")?,
                self.label("name")?
            )),
            BlockType::DataSource => Some(format!(
                "data.{}.{}",
                self.label("type")?,
                self.label("name")?
            )),
        }
    }

    /// Schema for the block body, when the schema reader knows the block
    pub fn schema(&self) -> Option<&BlockSchema> {
        self.schema.as_ref()
    }

    /// Attributes already assigned in the body
    pub fn attributes(&self) -> &[BodyItem] {
        &self.skeleton.attributes
    }

    pub fn nested_blocks(&self) -> &[BodyItem] {
        &self.skeleton.nested_blocks
    }

    pub fn is_closed(&self) -> bool {
        self.skeleton.close_brace.is_some()
    }

    pub fn body_contains(&self, pos: Pos) -> bool {
        self.skeleton.body_contains(pos)
    }

    pub fn tokens(&self) -> &Tokens {
        &self.tokens
    }
}

/// Builds one block type
pub trait BlockFactory: Send + Sync {
    fn block_type(&self) -> BlockType;

    fn label_schema(&self) -> LabelSchema;

    fn documentation(&self) -> MarkupContent;

    fn build(&self, tokens: &Tokens) -> Result<ConfigBlock, BlockError>;
}

fn markdown(value: &str) -> MarkupContent {
    MarkupContent {
        kind: MarkupKind::Markdown,
        value: value.to_string(),
    }
}

/// Shared construction: check the keyword, the label shape and arity, then
/// attach the schema for the block's identity.
///
/// Labels may be written quoted or as bare identifiers. The descriptor's
/// `quoted` flag only decides how completion snippets write them.
fn new_config_block(
    block_type: BlockType,
    label_schema: LabelSchema,
    schema_reader: Option<&dyn SchemaReader>,
    tokens: &Tokens,
) -> Result<ConfigBlock, BlockError> {
    let skeleton = extract_block(tokens);

    if skeleton.keyword != block_type.keyword() {
        return Err(BlockError::UnexpectedBlockType {
            expected: block_type.keyword(),
            found: skeleton.keyword,
        });
    }

    if let Some(token) = &skeleton.unexpected {
        return Err(BlockError::InvalidLabel {
            index: skeleton.labels.len(),
            found: token.text.clone(),
        });
    }

    if skeleton.labels.len() > label_schema.len() {
        return Err(BlockError::TooManyLabels {
            expected: label_schema.len(),
            found: skeleton.labels.len(),
        });
    }

    let labels: Vec<Label> = label_schema
        .iter()
        .zip(&skeleton.labels)
        .map(|(descriptor, raw)| Label {
            name: descriptor.name,
            value: raw.value.clone(),
            range: raw.range,
        })
        .collect();

    let values: Vec<String> = labels.iter().map(|l| l.value.clone()).collect();
    let schema =
        schema_reader.and_then(|r| r.lookup_block_schema(block_type.keyword(), &values));
    if schema.is_none() {
        tracing::debug!(block_type = %block_type, labels = ?values, "no schema found for block");
    }

    Ok(ConfigBlock {
        block_type,
        labels,
        schema,
        skeleton,
        tokens: tokens.clone(),
    })
}

pub struct ProviderBlockFactory {
    schema_reader: Option<Arc<dyn SchemaReader>>,
}

impl BlockFactory for ProviderBlockFactory {
    fn block_type(&self) -> BlockType {
        BlockType::Provider
    }

    fn label_schema(&self) -> LabelSchema {
        PROVIDER_LABELS
    }

    fn documentation(&self) -> MarkupContent {
        markdown(
            "A provider block is used to specify a provider configuration. \
             The body of the block contains configuration arguments for the provider itself.",
        )
    }

    fn build(&self, tokens: &Tokens) -> Result<ConfigBlock, BlockError> {
        new_config_block(
            self.block_type(),
            self.label_schema(),
            self.schema_reader.as_deref(),
            tokens,
        )
    }
}

pub struct ResourceBlockFactory {
    schema_reader: Option<Arc<dyn SchemaReader>>,
}

impl BlockFactory for ResourceBlockFactory {
    fn block_type(&self) -> BlockType {
        BlockType::Resource
    }

    fn label_schema(&self) -> LabelSchema {
        RESOURCE_LABELS
    }

    fn documentation(&self) -> MarkupContent {
        markdown(
            "A resource block declares a resource of a given type with a given local name. \
             The name is used to refer to this resource from elsewhere in the same module, \
             but has no significance outside of the scope of a module.",
        )
    }

    fn build(&self, tokens: &Tokens) -> Result<ConfigBlock, BlockError> {
        new_config_block(
            self.block_type(),
            self.label_schema(),
            self.schema_reader.as_deref(),
            tokens,
        )
    }
}

pub struct DataSourceBlockFactory {
    schema_reader: Option<Arc<dyn SchemaReader>>,
}

impl BlockFactory for DataSourceBlockFactory {
    fn block_type(&self) -> BlockType {
        BlockType::DataSource
    }

    fn label_schema(&self) -> LabelSchema {
        RESOURCE_LABELS
    }

    fn documentation(&self) -> MarkupContent {
        markdown(
            "A data block requests that Terraform read from a given data source and export \
             the result under the given local name. The name is used to refer to this data \
             source from elsewhere in the same module.",
        )
    }

    fn build(&self, tokens: &Tokens) -> Result<ConfigBlock, BlockError> {
        new_config_block(
            self.block_type(),
            self.label_schema(),
            self.schema_reader.as_deref(),
            tokens,
        )
    }
}

/// Factories keyed by block type keyword
pub struct BlockFactoryRegistry {
    factories: HashMap<&'static str, Box<dyn BlockFactory>>,
}

impl BlockFactoryRegistry {
    /// Registry with the built-in block types, all sharing one schema reader
    pub fn new(schema_reader: Option<Arc<dyn SchemaReader>>) -> Self {
        let factories: [Box<dyn BlockFactory>; 3] = [
            Box::new(ProviderBlockFactory {
                schema_reader: schema_reader.clone(),
            }),
            Box::new(ResourceBlockFactory {
                schema_reader: schema_reader.clone(),
            }),
            Box::new(DataSourceBlockFactory { schema_reader }),
        ];

        Self {
            factories: factories
                .into_iter()
                .map(|f| (f.block_type().keyword(), f))
                .collect(),
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&dyn BlockFactory> {
        self.factories.get(keyword).map(|f| &**f)
    }

    /// Registered keywords and factories, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &dyn BlockFactory)> + '_ {
        self.factories.iter().map(|(k, f)| (*k, &**f))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for BlockFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keywords: Vec<_> = self.factories.keys().collect();
        keywords.sort();
        f.debug_struct("BlockFactoryRegistry")
            .field("block_types", &keywords)
            .finish()
    }
}
