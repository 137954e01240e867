//! Listener registry for ingestion events.
//!
//! Callbacks run synchronously on the ingestion task, in registration order. A
//! slow callback delays the loop; hand heavy work off to a channel.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use super::error::IngestError;
use crate::chain::{BlockRecord, TransactionRecord};

/// A block accepted by the ingestion loop. Its transactions are always
/// [`crate::chain::BlockTransactions::Full`].
#[derive(Debug, Clone, Serialize)]
pub struct BlockEvent {
    pub block: BlockRecord,
}

/// Position of a transaction in the block it was announced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxSource {
    pub block_number: u64,
    pub block_hash: Option<String>,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionEvent {
    pub transaction: TransactionRecord,
    pub source: TxSource,
}

/// Handle returned by the `on_*` methods, used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry {
    next_id: u64,
    blocks: Vec<(ListenerId, Listener<BlockEvent>)>,
    transactions: Vec<(ListenerId, Listener<TransactionEvent>)>,
    errors: Vec<(ListenerId, Listener<IngestError>)>,
}

impl Registry {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

pub struct EventBus {
    registry: RwLock<Registry>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry {
                next_id: 0,
                blocks: Vec::new(),
                transactions: Vec::new(),
                errors: Vec::new(),
            }),
        }
    }

    pub fn on_block<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&BlockEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        let id = registry.allocate();
        registry.blocks.push((id, Arc::new(listener)));
        id
    }

    pub fn on_transaction<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&TransactionEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        let id = registry.allocate();
        registry.transactions.push((id, Arc::new(listener)));
        id
    }

    pub fn on_error<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&IngestError) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        let id = registry.allocate();
        registry.errors.push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener of any kind. Returns `false` if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.write();
        let before =
            registry.blocks.len() + registry.transactions.len() + registry.errors.len();
        registry.blocks.retain(|(listener, _)| *listener != id);
        registry.transactions.retain(|(listener, _)| *listener != id);
        registry.errors.retain(|(listener, _)| *listener != id);
        before != registry.blocks.len() + registry.transactions.len() + registry.errors.len()
    }

    /// Detaches every listener.
    pub fn clear(&self) {
        let mut registry = self.registry.write();
        registry.blocks.clear();
        registry.transactions.clear();
        registry.errors.clear();
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        let registry = self.registry.read();
        registry.blocks.len() + registry.transactions.len() + registry.errors.len()
    }

    // Listeners are snapshotted before the calls so a callback may register or
    // remove listeners without deadlocking.

    pub(crate) fn emit_block(&self, event: &BlockEvent) {
        let listeners: Vec<_> =
            self.registry.read().blocks.iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub(crate) fn emit_transaction(&self, event: &TransactionEvent) {
        let listeners: Vec<_> =
            self.registry.read().transactions.iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub(crate) fn emit_error(&self, error: &IngestError) {
        let listeners: Vec<_> =
            self.registry.read().errors.iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(error);
        }
    }
}
