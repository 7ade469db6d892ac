//! Folio Types - the shared vocabulary of the registry.
//!
//! Every other Folio crate speaks in these types: work identifiers and
//! principals, the persisted records (works, integrity fingerprints, access
//! grants, activity counters, platform state, pending operations), and the
//! single `RegistryError` taxonomy returned by every operation.

#![deny(unsafe_code)]

mod access;
mod activity;
mod error;
mod ids;
mod integrity;
mod pending;
mod platform;
mod work;

pub use access::{AccessGrant, PermissionTier};
pub use activity::ActivityRecord;
pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use ids::{Height, Principal, WorkId};
pub use integrity::{Fingerprint, HashAlgorithm, IntegrityRecord, FINGERPRINT_LEN};
pub use pending::{PendingKey, PendingOperation};
pub use platform::PlatformState;
pub use work::{WorkDraft, WorkRecord, WorkUpdate};
