use crate::ids::{Height, Principal, WorkId};
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Every failure a registry operation can report.
///
/// All variants are recoverable by the caller. A failing operation never
/// leaves partially applied state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("caller {caller} is not the platform supervisor")]
    SupervisorRestricted { caller: Principal },

    #[error("{0} not found")]
    NotFound(WorkId),

    #[error("caller {caller} is not the creator of {work_id}")]
    Ownership { work_id: WorkId, caller: Principal },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("invalid permission tier {0}")]
    InvalidTier(u8),

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("no integrity record registered for {0}")]
    NoIntegrityRecord(WorkId),

    #[error("fingerprint does not match the one committed for {0}")]
    IntegrityMismatch(WorkId),

    #[error("platform suspended: {explanation}")]
    PlatformSuspended { explanation: String },

    #[error("rate limit exceeded for {principal}: {count} actions since height {last_action_height}")]
    RateLimitExceeded {
        principal: Principal,
        count: u32,
        last_action_height: Height,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Fieldless discriminant for callers that only branch on the kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SupervisorRestricted { .. } => ErrorKind::SupervisorRestricted,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Ownership { .. } => ErrorKind::Ownership,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::InvalidTier(_) => ErrorKind::InvalidTier,
            Self::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Self::NoIntegrityRecord(_) => ErrorKind::NoIntegrityRecord,
            Self::IntegrityMismatch(_) => ErrorKind::IntegrityMismatch,
            Self::PlatformSuspended { .. } => ErrorKind::PlatformSuspended,
            Self::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SupervisorRestricted,
    NotFound,
    Ownership,
    Validation,
    InvalidTier,
    UnsupportedAlgorithm,
    NoIntegrityRecord,
    IntegrityMismatch,
    PlatformSuspended,
    RateLimitExceeded,
    Storage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_field() {
        let err = RegistryError::validation("name", "must not be empty");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "invalid name: must not be empty");
    }

    #[test]
    fn ownership_error_message() {
        let err = RegistryError::Ownership {
            work_id: WorkId(3),
            caller: Principal::new("mallory"),
        };
        assert_eq!(err.to_string(), "caller mallory is not the creator of work-3");
    }
}
