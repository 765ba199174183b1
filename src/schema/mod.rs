//! Provider schema access for block factories

mod reader;

pub use reader::{
    AttributeSchema, BlockSchema, NestedBlockSchema, ProviderSchema, ProviderSchemas,
    SchemaError, SchemaReader,
};

#[cfg(test)]
pub(crate) use reader::tests::aws_schemas;
