//! Safety Checker (Banker's safety algorithm)
//!
//! Classifies a [`ResourceState`] as safe or deadlocked without mutating it.
//!
//! # Algorithm
//!
//! ```text
//! work   := available
//! finish := terminated
//! repeat
//!     for i in 0..n (index order)
//!         if !finish[i] and need[i] <= work
//!             work += allocation[i]; finish[i] := true; order.push(i)
//! until a full pass finishes nobody
//! deadlocked := { i | !finish[i] }
//! ```
//!
//! Several processes may finish within one pass, and a process later in the
//! pass sees the work released by earlier ones. The completion order is
//! therefore pass-major, index-ascending within a pass. Worst case is `n`
//! passes of `O(n·m)`.

use serde::Serialize;

use super::state::{ProcessId, ResourceState, Units};

/// Outcome of a safety check
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Classification {
    /// Live processes that can never complete, ascending
    pub deadlocked: Vec<ProcessId>,
    /// Processes in the order they were marked finished
    pub completion_order: Vec<ProcessId>,
}

impl Classification {
    /// `true` when no live process is deadlocked
    pub fn is_safe(&self) -> bool {
        self.deadlocked.is_empty()
    }

    /// The deadlocked set, or `None` when the state is safe
    pub fn deadlock(&self) -> Option<&[ProcessId]> {
        if self.is_safe() {
            None
        } else {
            Some(&self.deadlocked)
        }
    }

    /// Completion order restricted to live processes.
    ///
    /// Terminated processes start finished and are never appended, so this
    /// is the raw order; it is exposed separately for callers that want the
    /// guarantee spelled out.
    pub fn live_order(&self) -> &[ProcessId] {
        &self.completion_order
    }

    /// Whether `process` is in the deadlocked set
    pub fn is_deadlocked(&self, process: ProcessId) -> bool {
        self.deadlocked.binary_search(&process).is_ok()
    }

    /// Display names of the completion order
    pub fn order_names<'a>(&self, state: &'a ResourceState) -> Vec<&'a str> {
        names(state, &self.completion_order)
    }

    /// Display names of the deadlocked set
    pub fn deadlocked_names<'a>(&self, state: &'a ResourceState) -> Vec<&'a str> {
        names(state, &self.deadlocked)
    }
}

fn names<'a>(state: &'a ResourceState, ids: &[ProcessId]) -> Vec<&'a str> {
    ids.iter()
        .filter_map(|p| state.process_names().get(p.0))
        .map(String::as_str)
        .collect()
}

/// Stateless safety checker
pub struct SafetyChecker;

impl SafetyChecker {
    /// Classify a state as safe or deadlocked.
    ///
    /// Deterministic for a given state. Zero live processes is safe with an
    /// empty order; a process whose need is all zero is always grantable.
    pub fn classify(state: &ResourceState) -> Classification {
        let n = state.process_count();
        let need = state.need();
        let mut work = state.available().to_vec();
        let mut finish = state.terminated().to_vec();
        let mut completion_order = Vec::with_capacity(n);

        let mut passes = 0usize;
        loop {
            passes += 1;
            let mut progressed = false;
            for i in 0..n {
                if finish[i] || !fits(&need[i], &work) {
                    continue;
                }
                for (w, &held) in work.iter_mut().zip(&state.allocation()[i]) {
                    *w += held;
                }
                finish[i] = true;
                completion_order.push(ProcessId(i));
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        let deadlocked: Vec<ProcessId> = finish
            .iter()
            .enumerate()
            .filter(|(_, &done)| !done)
            .map(|(i, _)| ProcessId(i))
            .collect();

        tracing::debug!(
            passes,
            finished = completion_order.len(),
            deadlocked = deadlocked.len(),
            "safety check complete"
        );

        Classification {
            deadlocked,
            completion_order,
        }
    }

    /// Simulate `order` as a grant-then-release schedule.
    ///
    /// Each process in turn must have `need <= work`; it then returns its
    /// allocation to `work`. Returns the first process that cannot proceed.
    /// Terminated processes in `order` are skipped.
    pub fn replay_schedule(state: &ResourceState, order: &[ProcessId]) -> Result<(), ProcessId> {
        let mut work = state.available().to_vec();
        for &process in order {
            if process.0 >= state.process_count() {
                return Err(process);
            }
            if state.is_terminated(process) {
                continue;
            }
            if !fits(&state.need_row(process.0), &work) {
                return Err(process);
            }
            for (w, &held) in work.iter_mut().zip(&state.allocation()[process.0]) {
                *w += held;
            }
        }
        Ok(())
    }
}

impl ResourceState {
    /// Shorthand for [`SafetyChecker::classify`]
    pub fn classify(&self) -> Classification {
        SafetyChecker::classify(self)
    }
}

#[inline]
fn fits(need: &[Units], work: &[Units]) -> bool {
    need.iter().zip(work).all(|(n, w)| n <= w)
}
