//! Integration tests for the tf-config-lsp core
//!
//! These tests drive the public API the way the server does: documents are
//! opened in a store, edited through the sync gate, and parsed for completion
//! and diagnostics.

use std::sync::Arc;

use assert_matches::assert_matches;
use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent, Url};

use tf_config_lsp::diagnostics::{collect_block_diagnostics, DiagnosticCollector};
use tf_config_lsp::error::Error;
use tf_config_lsp::parser::{tokenize, BlockType, Pos};
use tf_config_lsp::schema::ProviderSchemas;
use tf_config_lsp::store::DocumentStore;
use tf_config_lsp::sync::{self, SyncOutcome};
use tf_config_lsp::version::find_compatible_parser;

const SCHEMA: &str = r#"{
  "format_version": "1.0",
  "provider_schemas": {
    "registry.terraform.io/hashicorp/aws": {
      "provider": { "version": 0, "block": { "attributes": {
        "region": { "type": "string", "required": true }
      } } },
      "resource_schemas": {
        "aws_instance": { "version": 1, "block": { "attributes": {
          "ami": { "type": "string", "required": true },
          "instance_type": { "type": "string", "optional": true },
          "id": { "type": "string", "computed": true }
        } } }
      }
    }
  }
}"#;

fn uri() -> Url {
    Url::parse("file:///work/main.tf").unwrap()
}

fn insert(line: u32, character: u32, text: &str) -> TextDocumentContentChangeEvent {
    let pos = Position { line, character };
    TextDocumentContentChangeEvent {
        range: Some(Range {
            start: pos,
            end: pos,
        }),
        range_length: None,
        text: text.to_string(),
    }
}

#[tokio::test]
async fn test_edit_sequence_with_stale_and_missing_versions() {
    let store = DocumentStore::new();
    store
        .open(uri(), "resource \"aws_instance\" \"web\" {\n".to_string(), 3)
        .await;

    let applied = sync::apply(&store, &uri(), 4, &[insert(1, 0, "  ami = \"x\"\n")])
        .await
        .unwrap();
    assert_eq!(applied, SyncOutcome::Applied { version: 4 });

    let stale = sync::apply(&store, &uri(), 3, &[insert(0, 0, "stale")])
        .await
        .unwrap();
    assert_eq!(stale, SyncOutcome::Stale { current: 4 });

    let missing = sync::apply(&store, &uri(), 6, &[insert(0, 0, "gap")])
        .await
        .unwrap();
    assert_eq!(missing, SyncOutcome::Missing { current: 4 });

    let snapshot = store.snapshot(&uri()).await.unwrap();
    assert_eq!(snapshot.version, 4);
    assert_eq!(
        snapshot.text,
        "resource \"aws_instance\" \"web\" {\n  ami = \"x\"\n"
    );
}

#[tokio::test]
async fn test_failed_change_keeps_previous_state() {
    let store = DocumentStore::new();
    store.open(uri(), "provider \"aws\" {}\n".to_string(), 1).await;
    let before = store.snapshot(&uri()).await.unwrap();

    let err = sync::apply(&store, &uri(), 2, &[insert(0, 1, "x"), insert(7, 0, "y")])
        .await
        .unwrap_err();
    assert_matches!(err, Error::ChangeApplicationFailed { .. });

    assert_eq!(store.snapshot(&uri()).await.unwrap(), before);
}

#[tokio::test]
async fn test_completion_after_incremental_edit() {
    let store = DocumentStore::new();
    store.open(uri(), String::new(), 0).await;
    sync::apply(&store, &uri(), 1, &[insert(0, 0, "resou")])
        .await
        .unwrap();

    let snapshot = store.snapshot(&uri()).await.unwrap();
    let pos = snapshot
        .pos_at(Position {
            line: 0,
            character: 5,
        })
        .unwrap();
    assert_eq!(pos, Pos::new(1, 6, 5));

    let parser = find_compatible_parser("0.12.24", None).unwrap();
    let candidates = parser.block_type_candidates(&snapshot.tokens(), pos);

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].label, "resource");
    assert_eq!(candidates[0].prefix_range.start.column, 1);
    assert_eq!(candidates[0].prefix_range.end, pos);
}

#[test]
fn test_every_candidate_matches_its_prefix() {
    let parser = find_compatible_parser("1.0.0", None).unwrap();

    for src in ["", "d", "p", "pro", "res", "resource", "x"] {
        let tokens = tokenize(src);
        let pos = Pos::new(1, src.chars().count() + 1, src.len());

        for candidate in parser.block_type_candidates(&tokens, pos) {
            assert!(candidate.label.starts_with(src), "{} / {}", candidate.label, src);
            assert_eq!(candidate.prefix_range.end, pos);
            assert_eq!(candidate.prefix_range.start.line, pos.line);
            assert_eq!(candidate.prefix_range.start.column, 1);
        }
    }
}

#[test]
fn test_unknown_block_type_is_rejected() {
    let parser = find_compatible_parser("1.0.0", None).unwrap();
    let err = parser
        .parse_block_from_tokens(&tokenize("foo \"bar\" {}"))
        .unwrap_err();
    assert_matches!(err, Error::UnknownBlockType { keyword } if keyword == "foo");
}

#[test]
fn test_parse_with_provider_schema() {
    let schemas = ProviderSchemas::from_json(SCHEMA).unwrap();
    let parser = find_compatible_parser("1.5.7", Some(Arc::new(schemas))).unwrap();

    let block = parser
        .parse_block_from_tokens(&tokenize(
            "resource \"aws_instance\" \"web\" {\n  ami = \"ami-1\"\n",
        ))
        .unwrap();
    assert_eq!(block.block_type(), BlockType::Resource);
    assert_eq!(block.name().as_deref(), Some("aws_instance.web"));
    assert!(block.schema().unwrap().attributes.contains_key("ami"));
}

#[test]
fn test_body_completion_with_schema() {
    let schemas = ProviderSchemas::from_json(SCHEMA).unwrap();
    let parser = find_compatible_parser("1.5.7", Some(Arc::new(schemas))).unwrap();

    let src = "resource \"aws_instance\" \"web\" {\n  ami = \"ami-1\"\n  \n}\n";
    let pos = Pos::new(3, 3, src.find("  \n}").unwrap() + 2);

    let mut labels: Vec<_> = parser
        .candidates_at_pos(&tokenize(src), pos)
        .into_iter()
        .map(|c| c.label)
        .collect();
    labels.sort();
    assert_eq!(labels, vec!["instance_type"]);
}

#[test]
fn test_old_terraform_is_unsupported() {
    assert_matches!(
        find_compatible_parser("0.11.14", None),
        Err(Error::UnsupportedVersion { component: "parser", .. })
    );
    assert_matches!(
        find_compatible_parser("latest", None),
        Err(Error::InvalidVersion { .. })
    );
}

#[test]
fn test_block_diagnostics() {
    let parser = find_compatible_parser("1.0.0", None).unwrap();
    let text = "provider \"aws\" \"west\" {\n}\nvariable \"x\" {}\n";

    let mut collector = DiagnosticCollector::new();
    collect_block_diagnostics(&parser, text, &mut collector);
    let diagnostics = collector.into_diagnostics();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].source.as_deref(), Some("tf-config-lsp"));
    assert_eq!(diagnostics[0].range.start, Position::new(0, 0));
}

#[test]
fn test_complete_header_keyword_gets_no_block_snippet() {
    let parser = find_compatible_parser("1.0.0", None).unwrap();
    let src = "resource \"a\" \"b\" {}";

    let candidates = parser.candidates_at_pos(&tokenize(src), Pos::new(1, 4, 3));
    assert!(candidates.is_empty());
}

#[test]
fn test_non_label_header_is_diagnosed() {
    let parser = find_compatible_parser("1.0.0", None).unwrap();
    let text = "resource = 5\n";

    let mut collector = DiagnosticCollector::new();
    collect_block_diagnostics(&parser, text, &mut collector);
    let diagnostics = collector.into_diagnostics();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "resource: label 0: expected a string or identifier, got \"=\""
    );
    assert_eq!(diagnostics[0].range.end, Position::new(0, 8));
}
