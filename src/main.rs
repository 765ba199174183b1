//! tf-config-lsp: LSP server for Terraform configuration files

use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use tf_config_lsp::Backend;

#[tokio::main]
async fn main() {
    // Log to stderr; stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting tf-config-lsp server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
