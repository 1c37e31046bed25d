//! Shared State Handle
//!
//! The engine has no internal locking. Hosts that reach one state from
//! several threads go through this handle, which serializes every operation
//! behind a single `parking_lot::Mutex`.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{
    Classification, EngineResult, ProcessId, RecoveryManager, RequestProtocol, ResourceState,
    Units, Victim,
};

/// Cloneable, thread-safe handle to one [`ResourceState`]
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<Mutex<ResourceState>>,
}

impl SharedState {
    /// Take ownership of a state
    pub fn new(state: ResourceState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut ResourceState) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ResourceState {
        self.inner.lock().clone()
    }

    /// Classify under the lock
    pub fn classify(&self) -> Classification {
        self.inner.lock().classify()
    }

    /// Optimistic grant under the lock
    pub fn grant(&self, process: ProcessId, request: &[Units]) -> EngineResult<()> {
        self.inner.lock().grant(process, request)
    }

    /// Release under the lock
    pub fn release(&self, process: ProcessId, release: &[Units]) -> EngineResult<()> {
        self.inner.lock().release(process, release)
    }

    /// Classify and auto-recover as one atomic step
    pub fn auto_recover(&self) -> EngineResult<Option<Victim>> {
        let mut state = self.inner.lock();
        let deadlocked = state.classify().deadlocked;
        RecoveryManager::auto_recover(&mut *state, &deadlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Snapshot;
    use std::thread;

    #[test]
    fn test_concurrent_grant_release_conserves_units() {
        let state = ResourceState::setup(Snapshot::new(
            (0..4).map(|i| format!("T{i}")).collect(),
            vec!["R".into()],
            vec![vec![0]; 4],
            vec![vec![10]; 4],
            vec![8],
        ))
        .unwrap();
        let shared = SharedState::new(state);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        if shared.grant(ProcessId(i), &[2]).is_ok() {
                            shared.release(ProcessId(i), &[2]).unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let end = shared.snapshot();
        assert!(end.is_conserved());
        assert_eq!(end.available(), &[8]);
    }

    #[test]
    fn test_auto_recover_through_handle() {
        let state = ResourceState::setup(Snapshot::new(
            vec!["A".into(), "B".into()],
            vec!["R".into()],
            vec![vec![1], vec![1]],
            vec![vec![2], vec![2]],
            vec![0],
        ))
        .unwrap();
        let shared = SharedState::new(state);
        assert!(!shared.classify().is_safe());
        let victim = shared.auto_recover().unwrap().unwrap();
        assert_eq!(victim.process, ProcessId(0));
        assert!(shared.with(|s| s.classify().is_safe()));
    }
}
