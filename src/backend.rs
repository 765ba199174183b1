//! LSP Backend implementation

use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::config::ServerConfig;
use crate::diagnostics::{collect_block_diagnostics, DiagnosticCollector};
use crate::document::DocumentSnapshot;
use crate::parser::{CandidateKind, CompletionCandidate, Parser};
use crate::schema::SchemaReader;
use crate::store::DocumentStore;
use crate::sync::{self, SyncOutcome};
use crate::version::{find_compatible_parser, parser_supports_terraform};

/// Settings fixed at initialization
#[derive(Default)]
struct ServerState {
    config: ServerConfig,
    schema_reader: Option<Arc<dyn SchemaReader>>,
}

/// The LSP backend that handles all language server requests
pub struct Backend {
    /// The LSP client for sending notifications
    client: Client,
    /// Open documents, each behind its own lock
    documents: Arc<DocumentStore>,
    state: Arc<RwLock<ServerState>>,
}

impl Backend {
    /// Create a new backend instance
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DocumentStore::new()),
            state: Arc::new(RwLock::new(ServerState::default())),
        }
    }

    /// Acquire a parser for the configured Terraform version
    async fn parser(&self) -> Option<Parser> {
        let state = self.state.read().await;
        let version = state.config.terraform_version();

        match find_compatible_parser(version, state.schema_reader.clone()) {
            Ok(parser) => Some(parser),
            Err(err) => {
                tracing::warn!("No parser available: {}", err);
                None
            }
        }
    }

    /// Validate a document snapshot and publish diagnostics
    async fn validate_document(&self, snapshot: DocumentSnapshot) {
        let Some(parser) = self.parser().await else {
            return;
        };
        let diagnostics = self.compute_diagnostics(&parser, &snapshot.text);

        self.client
            .publish_diagnostics(snapshot.uri, diagnostics, Some(snapshot.version))
            .await;
    }

    /// Compute diagnostics for the given text
    fn compute_diagnostics(&self, parser: &Parser, text: &str) -> Vec<Diagnostic> {
        let mut collector = DiagnosticCollector::new();
        collect_block_diagnostics(parser, text, &mut collector);
        tracing::debug!("Found {} diagnostic(s)", collector.len());
        collector.into_diagnostics()
    }
}

fn completion_item(snapshot: &DocumentSnapshot, candidate: CompletionCandidate) -> CompletionItem {
    let range = Range {
        start: snapshot.lsp_position(candidate.prefix_range.start),
        end: snapshot.lsp_position(candidate.prefix_range.end),
    };
    let kind = match candidate.kind {
        CandidateKind::BlockType => CompletionItemKind::CLASS,
        CandidateKind::Attribute => CompletionItemKind::PROPERTY,
        CandidateKind::NestedBlock => CompletionItemKind::STRUCT,
    };

    CompletionItem {
        label: candidate.label,
        kind: Some(kind),
        detail: candidate.detail,
        documentation: candidate.documentation.map(Documentation::MarkupContent),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range,
            new_text: candidate.snippet,
        })),
        ..Default::default()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let config = ServerConfig::from_initialization_options(params.initialization_options);
        if let Err(err) = parser_supports_terraform(config.terraform_version()) {
            tracing::warn!("{}", err);
        }

        {
            let mut state = self.state.write().await;
            state.schema_reader = config.load_schema_reader();
            state.config = config;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions::default()),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "tf-config-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("Server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        tracing::debug!("Document opened: {} (version {})", uri, version);

        self.documents
            .open(uri.clone(), params.text_document.text, version)
            .await;

        if let Some(snapshot) = self.documents.snapshot(&uri).await {
            self.validate_document(snapshot).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        match sync::apply(&self.documents, &uri, version, &params.content_changes).await {
            Ok(SyncOutcome::Applied { .. }) => {
                if let Some(snapshot) = self.documents.snapshot(&uri).await {
                    self.validate_document(snapshot).await;
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!("Failed to apply change to {}: {}", uri, err);
                self.client
                    .log_message(MessageType::ERROR, err.to_string())
                    .await;
            }
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        tracing::debug!("Document saved: {}", params.text_document.uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!("Document closed: {}", uri);

        self.documents.close(&uri).await;

        // Clear diagnostics for this document
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(snapshot) = self.documents.snapshot(&uri).await else {
            tracing::debug!("Completion for unknown document: {}", uri);
            return Ok(None);
        };
        let Some(parser) = self.parser().await else {
            return Ok(None);
        };

        let pos = match snapshot.pos_at(position) {
            Ok(pos) => pos,
            Err(err) => {
                tracing::debug!("Completion position rejected: {}", err);
                return Ok(None);
            }
        };

        let candidates = parser.candidates_at_pos(&snapshot.tokens(), pos);
        let mut items: Vec<CompletionItem> = candidates
            .into_iter()
            .map(|c| completion_item(&snapshot, c))
            .collect();
        items.sort_by(|a, b| a.label.cmp(&b.label));

        Ok(Some(CompletionResponse::Array(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::version::find_compatible_parser;

    #[test]
    fn test_completion_item_from_candidate() {
        let url = Url::parse("file:///main.tf").unwrap();
        let snapshot = Document::new(url, "resou", 1).snapshot();
        let parser = find_compatible_parser("1.0.0", None).unwrap();

        let pos = snapshot
            .pos_at(Position {
                line: 0,
                character: 5,
            })
            .unwrap();
        let mut candidates = parser.candidates_at_pos(&snapshot.tokens(), pos);
        assert_eq!(candidates.len(), 1);

        let item = completion_item(&snapshot, candidates.remove(0));
        assert_eq!(item.label, "resource");
        assert_eq!(item.kind, Some(CompletionItemKind::CLASS));
        assert_eq!(item.insert_text_format, Some(InsertTextFormat::SNIPPET));

        let Some(CompletionTextEdit::Edit(edit)) = item.text_edit else {
            panic!("expected a text edit");
        };
        assert_eq!(edit.range.start, Position::new(0, 0));
        assert_eq!(edit.range.end, Position::new(0, 5));
        assert!(edit.new_text.starts_with("resource \"${1:type}\""));
    }
}
