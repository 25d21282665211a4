//! Single-writer ingestion with copy-on-apply atomicity.
//!
//! Events are applied one at a time in strict (block, transaction, log)
//! order. Each event mutates a working clone of the committed snapshot; the
//! clone is published only if every mutation succeeded, so a failure
//! mid-event can never leave a half-updated hierarchy. On failure the ledger
//! stays at the last committed position: transient failures (token-metadata
//! reads) are retried by re-applying the same envelope, everything else
//! halts ingestion for an operator.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::config::WindowsConfig;
use crate::domain::{EventEnvelope, EventPosition, IntegrityError};
use crate::error::Result;
use crate::port::metadata::MetadataDecoder;
use crate::port::token::TokenMetadataSource;

use super::engine;
use super::store::EntityStore;

/// A cloneable read handle onto the committed snapshot.
///
/// `load` returns an `Arc` of the snapshot as of the last commit; readers
/// keep a consistent view for as long as they hold it, concurrently with
/// ingestion.
#[derive(Debug, Clone)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<Arc<EntityStore>>>,
}

impl SharedSnapshot {
    fn new(store: EntityStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// The committed snapshot as of the last successful apply.
    #[must_use]
    pub fn load(&self) -> Arc<EntityStore> {
        self.inner.read().clone()
    }

    fn publish(&self, store: Arc<EntityStore>) {
        *self.inner.write() = store;
    }
}

/// The event-sourced ledger: aggregation engine plus commit discipline.
pub struct Ledger<D, S> {
    decoder: D,
    tokens: S,
    windows: WindowsConfig,
    shared: SharedSnapshot,
    position: Option<EventPosition>,
}

impl<D: MetadataDecoder, S: TokenMetadataSource> Ledger<D, S> {
    /// Create an empty ledger.
    pub fn new(decoder: D, tokens: S, windows: WindowsConfig) -> Self {
        Self {
            decoder,
            tokens,
            windows,
            shared: SharedSnapshot::new(EntityStore::new()),
            position: None,
        }
    }

    /// Apply one event atomically.
    ///
    /// On error nothing is persisted and the position does not advance. A
    /// transient error (see [`crate::error::Error::is_transient`]) may be
    /// retried by calling `apply` again with the same envelope; any other
    /// error means ingestion is halted at this position.
    pub fn apply(&mut self, envelope: &EventEnvelope) -> Result<()> {
        let incoming = envelope.position();
        if let Some(last) = self.position {
            if incoming <= last {
                return Err(IntegrityError::OutOfOrder { last, incoming }.into());
            }
        }

        let mut working = (*self.shared.load()).clone();
        if let Err(error) = engine::apply_event(
            &mut working,
            envelope,
            &self.decoder,
            &self.tokens,
            &self.windows,
        ) {
            warn!(position = %incoming, %error, "event rejected; snapshot unchanged");
            return Err(error);
        }

        self.shared.publish(Arc::new(working));
        self.position = Some(incoming);
        Ok(())
    }

    /// The committed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<EntityStore> {
        self.shared.load()
    }

    /// A cloneable read handle for concurrent readers.
    #[must_use]
    pub fn reader(&self) -> SharedSnapshot {
        self.shared.clone()
    }

    /// Position of the last committed event, if any.
    #[must_use]
    pub fn position(&self) -> Option<EventPosition> {
        self.position
    }
}
