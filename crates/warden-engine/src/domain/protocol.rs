//! Request Protocol - Incremental Resource Traffic
//!
//! Two request paths share the same state:
//!
//! - **Optimistic** ([`RequestProtocol::grant`]): grants whenever the units
//!   are available. No check against declared need; the caller owns that.
//! - **Banker's** ([`ResourceState::request_safely`]): additionally requires
//!   `request <= need` and refuses grants that would leave the state
//!   deadlocked.
//!
//! Every successful grant or release moves the same units between
//! `available` and `allocation`, so per-type totals never change.

use serde::Serialize;

use super::error::{EngineError, EngineResult};
use super::safety::SafetyChecker;
use super::state::{ProcessId, ResourceState, ResourceTypeId, Units};

/// Incremental request/grant/release interface
pub trait RequestProtocol {
    /// Whether `request` fits in the currently available units.
    ///
    /// `false` for unknown or terminated processes and for vectors of the
    /// wrong length. Never mutates.
    fn can_grant(&self, process: ProcessId, request: &[Units]) -> bool;

    /// Move `request` from `available` into the process's allocation.
    ///
    /// # Errors
    /// - `InvalidProcessId` / `ProcessTerminated`: process is not live
    /// - `Shape`: vector length differs from the resource type count
    /// - `OverAllocation`: some `request[j] > available[j]`
    fn grant(&mut self, process: ProcessId, request: &[Units]) -> EngineResult<()>;

    /// Move `release` from the process's allocation back to `available`.
    ///
    /// # Errors
    /// - `InvalidProcessId` / `ProcessTerminated`: process is not live
    /// - `Shape`: vector length differs from the resource type count
    /// - `Underflow`: some `release[j] > allocation[process][j]`
    fn release(&mut self, process: ProcessId, release: &[Units]) -> EngineResult<()>;
}

/// Result of a successful Banker's request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOutcome {
    /// Completion order of the post-grant state
    pub completion_order: Vec<ProcessId>,
}

impl RequestProtocol for ResourceState {
    fn can_grant(&self, process: ProcessId, request: &[Units]) -> bool {
        self.check_live(process).is_ok()
            && self.check_vector(request).is_ok()
            && request.iter().zip(&self.available).all(|(r, a)| r <= a)
    }

    fn grant(&mut self, process: ProcessId, request: &[Units]) -> EngineResult<()> {
        self.check_live(process)?;
        self.check_vector(request)?;

        if let Some((j, (&requested, &available))) = request
            .iter()
            .zip(&self.available)
            .enumerate()
            .find(|(_, (r, a))| r > a)
        {
            return Err(EngineError::OverAllocation {
                process,
                resource: ResourceTypeId(j),
                requested,
                available,
            });
        }

        let row = &mut self.allocation[process.0];
        for ((avail, held), &units) in self.available.iter_mut().zip(row.iter_mut()).zip(request) {
            *avail -= units;
            *held += units;
        }

        tracing::debug!(%process, ?request, "granted");
        Ok(())
    }

    fn release(&mut self, process: ProcessId, release: &[Units]) -> EngineResult<()> {
        self.check_live(process)?;
        self.check_vector(release)?;

        let row = &self.allocation[process.0];
        if let Some((j, (&requested, &held))) = release
            .iter()
            .zip(row)
            .enumerate()
            .find(|(_, (r, h))| r > h)
        {
            return Err(EngineError::Underflow {
                process,
                resource: ResourceTypeId(j),
                requested,
                held,
            });
        }

        let row = &mut self.allocation[process.0];
        for ((avail, held), &units) in self.available.iter_mut().zip(row.iter_mut()).zip(release) {
            *held -= units;
            *avail += units;
        }

        tracing::debug!(%process, ?release, "released");
        Ok(())
    }
}

impl ResourceState {
    /// Full Banker's request: grant only if the result is still safe.
    ///
    /// The grant is evaluated on a scratch copy and committed only when the
    /// copy classifies safe, so a refused request leaves `self` untouched.
    ///
    /// # Errors
    /// - `InvalidProcessId` / `ProcessTerminated` / `Shape`: as for `grant`
    /// - `ExceedsDeclaredMax`: some `request[j] > need[process][j]`
    /// - `OverAllocation`: some `request[j] > available[j]`
    /// - `UnsafeRequest`: the post-grant state has deadlocked processes
    pub fn request_safely(
        &mut self,
        process: ProcessId,
        request: &[Units],
    ) -> EngineResult<RequestOutcome> {
        self.check_live(process)?;
        self.check_vector(request)?;

        let remaining = self.need_row(process.0);
        if let Some((j, (&requested, &need))) = request
            .iter()
            .zip(&remaining)
            .enumerate()
            .find(|(_, (r, n))| r > n)
        {
            return Err(EngineError::ExceedsDeclaredMax {
                process,
                resource: ResourceTypeId(j),
                requested,
                need,
            });
        }

        let mut scratch = self.clone();
        scratch.grant(process, request)?;

        let classification = SafetyChecker::classify(&scratch);
        if !classification.is_safe() {
            tracing::debug!(%process, deadlocked = ?classification.deadlocked, "request refused");
            return Err(EngineError::UnsafeRequest {
                process,
                deadlocked: classification.deadlocked,
            });
        }

        *self = scratch;
        Ok(RequestOutcome {
            completion_order: classification.completion_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{ErrorKind, ShapeError};
    use crate::domain::state::Snapshot;

    fn sample() -> ResourceState {
        ResourceState::setup(Snapshot::new(
            vec!["P0".into(), "P1".into(), "P2".into()],
            vec!["R0".into(), "R1".into(), "R2".into()],
            vec![vec![0, 1, 0], vec![2, 0, 0], vec![3, 0, 2]],
            vec![vec![7, 4, 3], vec![3, 2, 2], vec![3, 0, 2]],
            vec![3, 3, 2],
        ))
        .unwrap()
    }

    #[test]
    fn test_can_grant() {
        let s = sample();
        assert!(s.can_grant(ProcessId(0), &[3, 3, 2]));
        assert!(!s.can_grant(ProcessId(0), &[4, 0, 0]));
        assert!(!s.can_grant(ProcessId(0), &[1, 1]));
        assert!(!s.can_grant(ProcessId(9), &[0, 0, 0]));
    }

    #[test]
    fn test_grant_moves_units() {
        let mut s = sample();
        s.grant(ProcessId(1), &[1, 2, 0]).unwrap();
        assert_eq!(s.available(), &[2, 1, 2]);
        assert_eq!(s.allocation()[1], vec![3, 2, 0]);
        assert!(s.is_conserved());
    }

    #[test]
    fn test_grant_over_available_leaves_state_unchanged() {
        let mut s = sample();
        let before = s.clone();
        let err = s.grant(ProcessId(0), &[1, 4, 0]).unwrap_err();
        assert_eq!(
            err,
            EngineError::OverAllocation {
                process: ProcessId(0),
                resource: ResourceTypeId(1),
                requested: 4,
                available: 3,
            }
        );
        assert_eq!(s, before);
    }

    #[test]
    fn test_grant_ignores_declared_max() {
        // The optimistic path does not consult need.
        let mut s = sample();
        s.grant(ProcessId(2), &[0, 3, 0]).unwrap();
        assert_eq!(s.allocation()[2], vec![3, 3, 2]);
        assert_eq!(s.need()[2], vec![0, 0, 0]);
    }

    #[test]
    fn test_grant_rejects_wrong_length() {
        let mut s = sample();
        let err = s.grant(ProcessId(0), &[1]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Shape(ShapeError::VectorLength { expected: 3, found: 1 })
        ));
    }

    #[test]
    fn test_release_moves_units_back() {
        let mut s = sample();
        s.release(ProcessId(2), &[1, 0, 2]).unwrap();
        assert_eq!(s.available(), &[4, 3, 4]);
        assert_eq!(s.allocation()[2], vec![2, 0, 0]);
        assert!(s.is_conserved());
    }

    #[test]
    fn test_release_underflow() {
        let mut s = sample();
        let before = s.clone();
        let err = s.release(ProcessId(1), &[2, 1, 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Underflow);
        assert!(matches!(
            err,
            EngineError::Underflow { resource: ResourceTypeId(1), requested: 1, held: 0, .. }
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn test_terminated_process_is_not_live() {
        let mut s = sample();
        s.terminated[1] = true;
        assert!(!s.can_grant(ProcessId(1), &[0, 0, 0]));
        assert_eq!(
            s.grant(ProcessId(1), &[0, 0, 0]).unwrap_err(),
            EngineError::ProcessTerminated(ProcessId(1))
        );
        assert_eq!(
            s.release(ProcessId(1), &[0, 0, 0]).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_request_safely_grants_safe_request() {
        let mut s = sample();
        let outcome = s.request_safely(ProcessId(1), &[1, 0, 2]).unwrap();
        assert_eq!(s.available(), &[2, 3, 0]);
        assert_eq!(
            outcome.completion_order,
            vec![ProcessId(1), ProcessId(2), ProcessId(0)]
        );
    }

    #[test]
    fn test_request_safely_rejects_above_need() {
        let mut s = sample();
        let err = s.request_safely(ProcessId(1), &[2, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ExceedsDeclaredMax { requested: 2, need: 1, .. }
        ));
    }

    #[test]
    fn test_request_safely_refuses_unsafe_grant() {
        let mut s = sample();
        let before = s.clone();
        // Leaves nothing available; only P2 can finish afterwards.
        let err = s.request_safely(ProcessId(0), &[3, 3, 2]).unwrap_err();
        assert!(matches!(err, EngineError::UnsafeRequest { process: ProcessId(0), .. }));
        assert_eq!(s, before);
    }
}
