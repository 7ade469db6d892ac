//! Global platform switch.

use folio_storage::{RegistryStorage, Staged, WriteOp};
use folio_types::{PlatformState, Principal, RegistryError, RegistryResult};
use std::sync::Arc;

/// Suspend/resume control held by a single supervisor principal.
pub struct PlatformSwitch {
    storage: Arc<dyn RegistryStorage>,
    supervisor: Principal,
}

impl PlatformSwitch {
    pub fn new(storage: Arc<dyn RegistryStorage>, supervisor: Principal) -> Self {
        Self {
            storage,
            supervisor,
        }
    }

    pub fn status(&self) -> RegistryResult<PlatformState> {
        Ok(self.storage.get_platform()?)
    }

    /// Fail with `PlatformSuspended` unless the platform is operational.
    pub fn ensure_operational(&self) -> RegistryResult<()> {
        let state = self.status()?;
        if state.suspended {
            return Err(RegistryError::PlatformSuspended {
                explanation: state.explanation,
            });
        }
        Ok(())
    }

    pub fn suspend(
        &self,
        caller: &Principal,
        explanation: impl Into<String>,
    ) -> RegistryResult<Staged<PlatformState>> {
        self.require_supervisor(caller)?;
        let state = PlatformState::suspended(explanation);
        Ok(Staged::new(
            state.clone(),
            vec![WriteOp::SetPlatform(state)],
        ))
    }

    /// Back to operational; the explanation is cleared.
    pub fn resume(&self, caller: &Principal) -> RegistryResult<Staged<PlatformState>> {
        self.require_supervisor(caller)?;
        let state = PlatformState::operational();
        Ok(Staged::new(
            state.clone(),
            vec![WriteOp::SetPlatform(state)],
        ))
    }

    fn require_supervisor(&self, caller: &Principal) -> RegistryResult<()> {
        if caller != &self.supervisor {
            return Err(RegistryError::SupervisorRestricted {
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}
