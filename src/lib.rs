//! tf-config-lsp: language server core for Terraform configuration
//!
//! This library provides the core functionality for the tf-config-lsp server:
//! - Version-gated incremental document synchronization
//! - Error-tolerant parsing of top-level blocks (`provider`, `resource`, `data`)
//! - Block type and schema-driven body completion
//! - Structural diagnostics for block headers
//!
//! # Example
//!
//! ```
//! use tf_config_lsp::parser::{tokenize, Pos};
//! use tf_config_lsp::version::find_compatible_parser;
//!
//! let parser = find_compatible_parser("1.5.7", None).unwrap();
//! let tokens = tokenize("resou");
//! let candidates = parser.block_type_candidates(&tokens, Pos::new(1, 6, 5));
//! assert_eq!(candidates[0].label, "resource");
//! ```

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod parser;
pub mod schema;
pub mod store;
pub mod sync;
pub mod version;

mod backend;

pub use backend::Backend;
pub use error::{Error, Result};
