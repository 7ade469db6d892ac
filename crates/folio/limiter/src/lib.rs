//! Activity monitor - bounds how many gated writes a principal may issue
//! per window of heights.
//!
//! Each principal has one counter and the height of its last counted
//! action. Once a full window has elapsed since that height the counter
//! restarts at one; otherwise it increments until the cap. This is a coarse
//! O(1) window, not a per-action log: a burst right after a reset is
//! counted from the reset, not from the oldest action still in view.

#![deny(unsafe_code)]

use folio_storage::{RegistryStorage, Staged, WriteOp};
use folio_types::{ActivityRecord, Height, Principal, RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Global window parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in heights.
    #[serde(default = "default_window")]
    pub window: Height,
    /// Actions admitted per window.
    #[serde(default = "default_max_actions")]
    pub max_actions: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            max_actions: default_max_actions(),
        }
    }
}

fn default_window() -> Height {
    100
}

fn default_max_actions() -> u32 {
    10
}

/// Outcome of evaluating one action against a principal's counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Admitted; the counter to persist with the gated write.
    Admitted(ActivityRecord),
    /// Over the cap; the counter is unchanged.
    Rejected(ActivityRecord),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

impl RateLimitConfig {
    /// Decide one action at `height` given the principal's current counter.
    ///
    /// The window boundary is inclusive: an action exactly `window` heights
    /// after the last recorded one (`elapsed >= window`) starts a new window.
    pub fn evaluate(&self, current: ActivityRecord, height: Height) -> Admission {
        let elapsed = height.saturating_sub(current.last_action_height);
        if elapsed >= self.window {
            return Admission::Admitted(ActivityRecord {
                last_action_height: height,
                count: 1,
            });
        }
        if current.count < self.max_actions {
            return Admission::Admitted(ActivityRecord {
                last_action_height: height,
                count: current.count + 1,
            });
        }
        Admission::Rejected(current)
    }
}

/// Rate limiter over stored activity records.
pub struct ActivityMonitor {
    storage: Arc<dyn RegistryStorage>,
    policy: RateLimitConfig,
}

impl ActivityMonitor {
    pub fn new(storage: Arc<dyn RegistryStorage>, policy: RateLimitConfig) -> Self {
        Self { storage, policy }
    }

    /// Current counter for `principal`; never-seen principals read as zero.
    pub fn activity_of(&self, principal: &Principal) -> RegistryResult<ActivityRecord> {
        Ok(self.storage.get_activity(principal)?.unwrap_or_default())
    }

    /// Evaluate without staging anything.
    pub fn would_admit(&self, principal: &Principal, height: Height) -> RegistryResult<bool> {
        let current = self.activity_of(principal)?;
        Ok(self.policy.evaluate(current, height).is_admitted())
    }

    /// Admit one action, staging the advanced counter.
    ///
    /// The counter only changes if the caller commits the staged write, so an
    /// operation that fails a later check leaves the principal's quota intact.
    pub fn admit(
        &self,
        principal: &Principal,
        height: Height,
    ) -> RegistryResult<Staged<ActivityRecord>> {
        let current = self.activity_of(principal)?;
        match self.policy.evaluate(current, height) {
            Admission::Admitted(next) => {
                debug!(
                    principal = %principal,
                    count = next.count,
                    height,
                    "Activity admitted"
                );
                let op = WriteOp::PutActivity {
                    principal: principal.clone(),
                    record: next,
                };
                Ok(Staged::new(next, vec![op]))
            }
            Admission::Rejected(record) => Err(RegistryError::RateLimitExceeded {
                principal: principal.clone(),
                count: record.count,
                last_action_height: record.last_action_height,
            }),
        }
    }
}
