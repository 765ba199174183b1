//! Open document store
//!
//! Each document sits behind its own mutex so that edits to one file never wait
//! on another. The outer map lock is only held long enough to find or insert the
//! per-document handle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tower_lsp::lsp_types::Url;

use crate::document::{Document, DocumentSnapshot};

/// Shared handle to a single document
pub type DocumentHandle = Arc<Mutex<Document>>;

/// Map of document URIs to their state
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<Url, DocumentHandle>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly opened document, replacing any previous state for the URI
    pub async fn open(&self, uri: Url, text: String, version: i32) {
        let document = Document::new(uri.clone(), &text, version);
        let mut docs = self.documents.write().await;
        docs.insert(uri, Arc::new(Mutex::new(document)));
    }

    /// Forget a document. Returns whether it was open.
    pub async fn close(&self, uri: &Url) -> bool {
        let mut docs = self.documents.write().await;
        docs.remove(uri).is_some()
    }

    /// The lock guarding one document, if it is open
    pub async fn handle(&self, uri: &Url) -> Option<DocumentHandle> {
        let docs = self.documents.read().await;
        docs.get(uri).cloned()
    }

    /// Read the committed text and version in one step
    pub async fn snapshot(&self, uri: &Url) -> Option<DocumentSnapshot> {
        let handle = self.handle(uri).await?;
        let document = handle.lock().await;
        Some(document.snapshot())
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///{}", name)).unwrap()
    }

    #[tokio::test]
    async fn test_open_and_snapshot() {
        let store = DocumentStore::new();
        store
            .open(uri("main.tf"), "provider \"aws\" {}".to_string(), 3)
            .await;

        let snapshot = store.snapshot(&uri("main.tf")).await.unwrap();
        assert_eq!(snapshot.text, "provider \"aws\" {}");
        assert_eq!(snapshot.version, 3);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_close_removes_document() {
        let store = DocumentStore::new();
        store.open(uri("main.tf"), String::new(), 1).await;

        assert!(store.close(&uri("main.tf")).await);
        assert!(!store.close(&uri("main.tf")).await);
        assert!(store.snapshot(&uri("main.tf")).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_reopen_resets_version() {
        let store = DocumentStore::new();
        store.open(uri("a.tf"), "one".to_string(), 7).await;
        store.open(uri("a.tf"), "two".to_string(), 1).await;

        let snapshot = store.snapshot(&uri("a.tf")).await.unwrap();
        assert_eq!(snapshot.text, "two");
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn test_documents_are_independent() {
        let store = DocumentStore::new();
        store.open(uri("a.tf"), "a".to_string(), 1).await;
        store.open(uri("b.tf"), "b".to_string(), 1).await;

        // Holding one document's lock must not block access to another
        let handle = store.handle(&uri("a.tf")).await.unwrap();
        let _guard = handle.lock().await;

        let snapshot = store.snapshot(&uri("b.tf")).await.unwrap();
        assert_eq!(snapshot.text, "b");
    }
}
