//! Shared, thread-safe access to one gate.

use std::sync::{Arc, Mutex, MutexGuard};

use folio_types::{RegistryError, RegistryResult};

use crate::gate::PolicyGate;

/// Cloneable handle serializing every request through one gate.
///
/// Lock acquisition order is the transaction order.
#[derive(Clone)]
pub struct RegistryHandle {
    inner: Arc<Mutex<PolicyGate>>,
}

impl RegistryHandle {
    pub fn new(gate: PolicyGate) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gate)),
        }
    }

    /// Run `f` with exclusive access to the gate.
    pub fn execute<R>(
        &self,
        f: impl FnOnce(&mut PolicyGate) -> RegistryResult<R>,
    ) -> RegistryResult<R> {
        let mut gate = self.lock()?;
        f(&mut gate)
    }

    fn lock(&self) -> RegistryResult<MutexGuard<'_, PolicyGate>> {
        self.inner
            .lock()
            .map_err(|_| RegistryError::Storage("gate lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use folio_storage::{InMemoryRegistryStorage, ManualClock};
    use folio_types::{Principal, WorkDraft, WorkId};
    use std::collections::BTreeSet;
    use std::thread;

    #[test]
    fn concurrent_registrations_get_distinct_ids() {
        let storage = Arc::new(InMemoryRegistryStorage::new());
        let clock = Arc::new(ManualClock::new(1));
        let handle = RegistryHandle::new(PolicyGate::new(
            storage,
            clock,
            RegistryConfig::default(),
        ));

        let workers: Vec<_> = (0..8)
            .map(|n| {
                let handle = handle.clone();
                thread::spawn(move || {
                    let caller = Principal::new(format!("creator-{n}"));
                    (0..5)
                        .map(|_| {
                            handle
                                .execute(|gate| {
                                    let draft = WorkDraft::new(
                                        "Piece",
                                        10,
                                        "Concurrent",
                                        vec!["test".to_string()],
                                    );
                                    gate.register_work(&caller, draft)
                                })
                                .unwrap()
                        })
                        .collect::<Vec<WorkId>>()
                })
            })
            .collect();

        let ids: BTreeSet<WorkId> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 40);
        assert_eq!(ids.iter().next(), Some(&WorkId(1)));
        assert_eq!(ids.iter().last(), Some(&WorkId(40)));
        assert_eq!(handle.execute(|gate| gate.work_count()).unwrap(), 40);
        assert!(handle.execute(|gate| gate.verify_journal()).unwrap().valid);
    }
}
