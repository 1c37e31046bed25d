//! Recovery Manager
//!
//! Breaks deadlocks by terminating processes. A terminated process returns
//! its whole allocation to `available`, its declared maximum is zeroed (so it
//! needs nothing), and it is excluded from every later safety check or grant.
//!
//! Automatic recovery picks the deadlocked process holding the most units in
//! total, lowest index on ties. One victim is not guaranteed to clear the
//! deadlock, so [`RecoveryManager::recover_until_safe`] repeats
//! classify-then-terminate until the state is safe or the round limit hits.

use serde::Serialize;

use super::error::EngineResult;
use super::safety::{Classification, SafetyChecker};
use super::state::{ProcessId, ResourceState, Units};

/// A process terminated during recovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Victim {
    /// Terminated process
    pub process: ProcessId,
    /// Display name of the process
    pub name: String,
    /// Units returned to `available`, per resource type
    pub released: Vec<Units>,
}

/// Bounds for [`RecoveryManager::recover_until_safe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryConfig {
    /// Maximum number of processes to terminate.
    ///
    /// `None` allows one round per live process, which always suffices.
    pub max_rounds: Option<usize>,
}

impl RecoveryConfig {
    /// Config with an explicit round limit
    pub fn with_max_rounds(max_rounds: usize) -> Self {
        Self {
            max_rounds: Some(max_rounds),
        }
    }
}

/// Record of a multi-round recovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryLog {
    /// Victims in termination order
    pub victims: Vec<Victim>,
    /// Classification after the last round
    pub outcome: Classification,
}

impl RecoveryLog {
    /// Whether recovery ended in a safe state
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_safe()
    }
}

impl ResourceState {
    /// Terminate a process and return its allocation to the pool.
    ///
    /// Terminating an already-terminated process is allowed and changes
    /// nothing, since its allocation and maximum are already zero.
    ///
    /// # Errors
    /// - `InvalidProcessId`: `process` is outside `0..n`
    pub fn terminate_process(&mut self, process: ProcessId) -> EngineResult<Vec<Units>> {
        self.check_process(process)?;

        let i = process.0;
        let zeroed = vec![0; self.resource_count()];
        let released = std::mem::replace(&mut self.allocation[i], zeroed);
        for (avail, &units) in self.available.iter_mut().zip(&released) {
            *avail += units;
        }
        self.max_demand[i].iter_mut().for_each(|mx| *mx = 0);
        self.terminated[i] = true;

        tracing::info!(%process, name = %self.process_names[i], ?released, "process terminated");
        Ok(released)
    }

    /// Terminate a process resolved by exact name.
    ///
    /// # Errors
    /// - `ProcessNotFound`: no process has this name
    pub fn terminate_by_name(&mut self, name: &str) -> EngineResult<Victim> {
        let process = self.index_of(name)?;
        let released = self.terminate_process(process)?;
        Ok(Victim {
            process,
            name: name.to_string(),
            released,
        })
    }
}

/// Deadlock recovery strategies
pub struct RecoveryManager;

impl RecoveryManager {
    /// Pick the deadlocked process holding the most units in total.
    ///
    /// Ties go to the lowest index. Returns `None` for an empty set.
    ///
    /// # Errors
    /// - `InvalidProcessId`: the set names a process outside `0..n`
    pub fn select_victim(
        state: &ResourceState,
        deadlocked: &[ProcessId],
    ) -> EngineResult<Option<ProcessId>> {
        let mut best: Option<(ProcessId, u128)> = None;
        for &process in deadlocked {
            let held = state.held_total(process)?;
            best = match best {
                Some((current, most))
                    if most > held || (most == held && current < process) =>
                {
                    Some((current, most))
                }
                _ => Some((process, held)),
            };
        }
        Ok(best.map(|(process, _)| process))
    }

    /// Terminate the largest holder among `deadlocked`.
    ///
    /// Returns `Ok(None)` without touching state when the set is empty.
    /// Callers should classify again afterwards: one victim may not be
    /// enough.
    pub fn auto_recover(
        state: &mut ResourceState,
        deadlocked: &[ProcessId],
    ) -> EngineResult<Option<Victim>> {
        let Some(process) = Self::select_victim(state, deadlocked)? else {
            return Ok(None);
        };
        let released = state.terminate_process(process)?;
        let name = state.process_names[process.0].clone();
        Ok(Some(Victim {
            process,
            name,
            released,
        }))
    }

    /// Alternate classification and automatic recovery until safe.
    ///
    /// Stops after `config.max_rounds` victims, or one per live process when
    /// unbounded.
    pub fn recover_until_safe(
        state: &mut ResourceState,
        config: RecoveryConfig,
    ) -> EngineResult<RecoveryLog> {
        let limit = config
            .max_rounds
            .unwrap_or_else(|| state.live_processes().count());
        let mut victims = Vec::new();
        let mut outcome = SafetyChecker::classify(state);

        while !outcome.is_safe() && victims.len() < limit {
            match Self::auto_recover(state, &outcome.deadlocked)? {
                Some(victim) => {
                    tracing::info!(
                        round = victims.len() + 1,
                        victim = %victim.name,
                        "recovery round"
                    );
                    victims.push(victim);
                }
                None => break,
            }
            outcome = SafetyChecker::classify(state);
        }

        if !outcome.is_safe() {
            tracing::warn!(
                rounds = victims.len(),
                remaining = outcome.deadlocked.len(),
                "recovery stopped with deadlocked processes"
            );
        }

        Ok(RecoveryLog { victims, outcome })
    }
}
