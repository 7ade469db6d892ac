//! Folio storage collaborators.
//!
//! The registry core treats persistence and time as external services:
//! - a key-value store with atomic multi-key writes (`WriteBatch`)
//! - a monotonic height clock (`HeightClock`)
//! - an append-only, hash-linked journal of committed mutations
//!
//! Reads go through small per-concern traits; every write goes through
//! `BatchWriter::apply`, which commits a whole batch or nothing.
//! `InMemoryRegistryStorage` is the deterministic reference backend.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod clock;
mod error;
pub mod journal;
pub mod memory;
mod model;
mod traits;

pub use clock::{HeightClock, ManualClock};
pub use error::{StorageError, StorageResult};
pub use journal::{compute_journal_hash, verify_chain, ChainVerification};
pub use memory::InMemoryRegistryStorage;
pub use model::{
    JournalAction, JournalAppend, JournalRecord, RegistrySnapshot, Staged, WriteBatch, WriteOp,
};
pub use traits::{
    AccessStore, ActivityStore, BatchWriter, IntegrityStore, JournalStore, PendingStore,
    PlatformStore, QueryWindow, RegistryStorage, WorkStore,
};
