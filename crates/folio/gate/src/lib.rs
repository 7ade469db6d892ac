//! Folio Gate - the single entry point of the registry.
//!
//! `PolicyGate` composes the record store, access matrix, activity monitor,
//! integrity ledger, platform switch and pending-operation stub over one
//! storage backend and one height clock. Every mutation it accepts becomes a
//! single atomic `WriteBatch` with one hash-linked journal entry.
//!
//! ```text
//! request ─► platform ─► rate limit ─► ownership ─► validation ─► commit
//!                        (protected
//!                         register)
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod gate;
pub mod handle;
pub mod pending;
pub mod platform;
pub mod telemetry;

pub use config::{LoggingConfig, PendingConfig, RateLimitConfig, RegistryConfig};
pub use gate::PolicyGate;
pub use handle::RegistryHandle;
pub use pending::{verification_code, PendingOperations, TRANSFER_OPERATION};
pub use platform::PlatformSwitch;
pub use telemetry::init_tracing;
