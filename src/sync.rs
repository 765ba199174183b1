//! Version-gated document synchronization
//!
//! Editors number every `didChange` notification. Only the notification that
//! directly follows the stored version is applied. Older ones were already
//! superseded, and newer ones mean something in between was lost; both are
//! skipped without an error so the session survives reordering on the wire.
//!
//! Lost notifications are not recovered: there is no request for a fresh copy of
//! the text, and the document stays at its last applied version until the editor
//! reopens it.

use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// What happened to a change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The batch was applied and the document moved to the new version
    Applied { version: i32 },
    /// The version was not newer than the stored one
    Stale { current: i32 },
    /// One or more versions between the stored one and this one never arrived
    Missing { current: i32 },
}

/// How an incoming version relates to the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Apply,
    SkipStale,
    SkipMissing,
}

fn decide(current: i32, incoming: i32) -> Decision {
    if incoming <= current {
        Decision::SkipStale
    } else if incoming > current.saturating_add(1) {
        Decision::SkipMissing
    } else {
        Decision::Apply
    }
}

/// Apply a change notification to a stored document.
///
/// The document lock is held from the version check through to the commit, so
/// concurrent notifications for the same document are serialized and readers
/// never see a half-applied batch.
pub async fn apply(
    store: &DocumentStore,
    uri: &Url,
    version: i32,
    changes: &[TextDocumentContentChangeEvent],
) -> Result<SyncOutcome> {
    let handle = store
        .handle(uri)
        .await
        .ok_or_else(|| Error::DocumentNotFound { uri: uri.clone() })?;

    let mut document = handle.lock().await;
    let current = document.version();

    match decide(current, version) {
        Decision::SkipStale => {
            tracing::info!(
                %uri,
                version,
                current,
                changes = changes.len(),
                "skip old version change"
            );
            Ok(SyncOutcome::Stale { current })
        }
        Decision::SkipMissing => {
            tracing::info!(
                %uri,
                version,
                current,
                changes = changes.len(),
                "missing version change"
            );
            Ok(SyncOutcome::Missing { current })
        }
        Decision::Apply => {
            document.apply(version, changes)?;
            tracing::debug!(%uri, version, "applied {} change(s)", changes.len());
            Ok(SyncOutcome::Applied { version })
        }
    }
}
