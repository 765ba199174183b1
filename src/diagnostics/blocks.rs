//! Structural diagnostics for top-level blocks
//!
//! Each top-level block is run through the parser. Blocks whose factory rejects
//! them are reported on their keyword. Unknown block types are skipped: the
//! language has more block types (`variable`, `module`, ...) than the parser
//! models, and those are not errors.

use ropey::Rope;
use tower_lsp::lsp_types::Range;

use super::DiagnosticCollector;
use crate::document::lsp_position;
use crate::error::Error;
use crate::parser::{extract_block, split_blocks, tokenize, Parser};

/// Check every top-level block of `text`
pub fn collect_block_diagnostics(
    parser: &Parser,
    text: &str,
    collector: &mut DiagnosticCollector,
) {
    let tokens = tokenize(text);
    let content = Rope::from_str(text);

    for span in split_blocks(&tokens) {
        let block_tokens = tokens.slice(span);

        match parser.parse_block_from_tokens(&block_tokens) {
            Ok(block) => {
                tracing::debug!(block_type = %block.block_type(), name = ?block.name(), "block ok")
            }
            Err(err @ Error::FactoryRejected { .. }) => {
                let keyword = extract_block(&block_tokens).keyword_range;
                let range = Range {
                    start: lsp_position(&content, keyword.start),
                    end: lsp_position(&content, keyword.end),
                };
                collector.add_error(err.to_string(), range);
            }
            Err(err) => tracing::debug!(error = %err, "skipping block"),
        }
    }
}

#[cfg(test)]
mod tests {
    use tower_lsp::lsp_types::{DiagnosticSeverity, Position};

    use super::*;
    use crate::version::find_compatible_parser;

    fn diagnostics(text: &str) -> Vec<tower_lsp::lsp_types::Diagnostic> {
        let parser = find_compatible_parser("1.5.0", None).unwrap();
        let mut collector = DiagnosticCollector::new();
        collect_block_diagnostics(&parser, text, &mut collector);
        collector.into_diagnostics()
    }

    #[test]
    fn test_valid_configuration() {
        let text = r#"
provider "aws" {
  region = "us-east-1"
}

resource "aws_instance" "web" {
  ami = "ami-123"
}
"#;
        assert!(diagnostics(text).is_empty());
    }

    #[test]
    fn test_too_many_labels_reported_on_keyword() {
        let text = "provider \"aws\" {}\n\nresource \"a\" \"b\" \"c\" {\n}\n";
        let diagnostics = diagnostics(text);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(
            diagnostics[0].message,
            "resource: expected at most 2 labels, got 3"
        );
        assert_eq!(
            diagnostics[0].range.start,
            Position {
                line: 2,
                character: 0
            }
        );
        assert_eq!(
            diagnostics[0].range.end,
            Position {
                line: 2,
                character: 8
            }
        );
    }

    #[test]
    fn test_unknown_and_incomplete_blocks_are_quiet() {
        let text = "variable \"region\" {}\nterraform {\n}\nresou\nresource \"aws_instance\" {\n";
        assert!(diagnostics(text).is_empty());
    }
}
