//! Error types shared by the document store, the sync gate and the parser

use semver::VersionReq;
use thiserror::Error;
use tower_lsp::lsp_types::Url;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced to the transport layer
#[derive(Debug, Error)]
pub enum Error {
    /// The Terraform version string could not be parsed
    #[error("invalid version {version:?}")]
    InvalidVersion { version: String },

    /// The Terraform version is outside the range a component supports
    #[error("{component} does not support Terraform {version} (requires {constraint})")]
    UnsupportedVersion {
        component: &'static str,
        version: String,
        constraint: VersionReq,
    },

    /// No tokens were given to the parser
    #[error("empty configuration")]
    EmptyInput,

    /// The leading keyword is not a registered block type
    #[error("unknown block type {keyword:?}")]
    UnknownBlockType { keyword: String },

    /// The factory for a known block type refused the tokens
    #[error("{keyword}: {cause}")]
    FactoryRejected {
        keyword: String,
        #[source]
        cause: BlockError,
    },

    /// A change batch could not be applied; the document is untouched
    #[error("failed to apply changes: {cause}")]
    ChangeApplicationFailed {
        #[from]
        cause: ChangeError,
    },

    /// The document was never opened (or already closed)
    #[error("document not open: {uri}")]
    DocumentNotFound { uri: Url },
}

/// Reasons a single content change cannot be applied to a text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    #[error("position {line}:{character} is outside the document")]
    PositionOutOfBounds { line: u32, character: u32 },

    #[error("range start is after range end")]
    InvertedRange,
}

/// Structural reasons a block factory rejects its tokens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("expected at most {expected} labels, got {found}")]
    TooManyLabels { expected: usize, found: usize },

    #[error("label {index}: expected a string or identifier, got {found:?}")]
    InvalidLabel { index: usize, found: String },

    #[error("expected {expected:?} block, got {found:?}")]
    UnexpectedBlockType {
        expected: &'static str,
        found: String,
    },
}
