// ============================================================================
// Store - document persistence with optimistic transactions
// ============================================================================
//
// Generic persistence layer. Knows nothing about orders or couriers: it deals
// in versioned JSON documents, typed through serde at the edges.
//
// ============================================================================

mod document;
mod entity_store;
mod errors;
mod memory;
mod transaction;

pub use document::{
    apply_write, collections, encode, DocumentKey, Fields, ReadSet, VersionedDocument, Write, WriteOp,
};
pub use entity_store::EntityStore;
pub use errors::StoreError;
pub use memory::InMemoryEntityStore;
pub use transaction::{run_transaction, Transaction};
