//! Folio Records - the work record store.
//!
//! Validates work metadata, allocates identifiers from the work counter, and
//! stages creator-only updates, transfers and deletions. Nothing here writes
//! directly: every operation returns a [`Staged`](folio_storage::Staged) value
//! that the policy gate commits as part of one atomic batch.

#![deny(unsafe_code)]

mod store;
pub mod validation;

pub use store::RecordStore;
pub use validation::{
    validate_categories, validate_draft, validate_name, validate_size, validate_synopsis,
    MAX_CATEGORIES, MAX_CATEGORY_LEN, MAX_NAME_LEN, MAX_SIZE_EXCLUSIVE, MAX_SYNOPSIS_LEN,
};
