//! Domain Model: Resource State
//!
//! The authoritative snapshot of allocation, maximum demand, availability
//! and termination flags. Matrices are only mutated by the request protocol
//! and the recovery manager; everything else sees read-only slices.

use std::collections::HashSet;

use serde::Serialize;

use super::types::{MatrixKind, ProcessId, ResourceTypeId, Snapshot, Units};
use crate::domain::error::{EngineError, EngineResult, ShapeError};

/// Allocation state for a fixed set of processes and resource types
///
/// # Invariants
///
/// - `allocation[i][j] <= max_demand[i][j]` for every live process after setup
/// - `available[j] + Σ_i allocation[i][j] == totals[j]` across all operations
/// - Terminated processes hold nothing and need nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceState {
    pub(crate) process_names: Vec<String>,
    pub(crate) resource_names: Vec<String>,
    pub(crate) allocation: Vec<Vec<Units>>,
    pub(crate) max_demand: Vec<Vec<Units>>,
    pub(crate) available: Vec<Units>,
    pub(crate) terminated: Vec<bool>,
    /// Units of each type in the system, fixed at setup
    pub(crate) totals: Vec<Units>,
}

impl ResourceState {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Setup
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Build a fresh state from caller-supplied names and matrices.
    ///
    /// All processes start live.
    ///
    /// # Errors
    ///
    /// [`EngineError::Shape`] if dimensions disagree with the name lists, an
    /// entry is negative, a name is duplicated, or any allocation exceeds
    /// its declared maximum.
    pub fn setup(snapshot: Snapshot) -> EngineResult<Self> {
        let Snapshot {
            process_names,
            resource_names,
            allocation,
            max_demand,
            available,
        } = snapshot;

        let n = process_names.len();
        let m = resource_names.len();

        ensure_unique(&process_names)?;
        ensure_unique(&resource_names)?;

        let allocation = to_units(MatrixKind::Allocation, &allocation, n, m)?;
        let max_demand = to_units(MatrixKind::MaxDemand, &max_demand, n, m)?;

        if available.len() != m {
            return Err(ShapeError::AvailableLength {
                expected: m,
                found: available.len(),
            }
            .into());
        }
        let available = available
            .iter()
            .enumerate()
            .map(|(j, &value)| non_negative(MatrixKind::Available, 0, j, value))
            .collect::<Result<Vec<_>, _>>()?;

        for (i, (held, max)) in allocation.iter().zip(&max_demand).enumerate() {
            for (j, (&a, &mx)) in held.iter().zip(max).enumerate() {
                if a > mx {
                    return Err(ShapeError::ExceedsMaxDemand {
                        process: ProcessId(i),
                        resource: ResourceTypeId(j),
                        allocated: a,
                        max: mx,
                    }
                    .into());
                }
            }
        }

        let mut totals = available.clone();
        for (j, total) in totals.iter_mut().enumerate() {
            for row in &allocation {
                *total = total
                    .checked_add(row[j])
                    .ok_or(ShapeError::Overflow(ResourceTypeId(j)))?;
            }
        }

        tracing::debug!(processes = n, resources = m, "resource state set up");

        Ok(Self {
            process_names,
            resource_names,
            allocation,
            max_demand,
            available,
            terminated: vec![false; n],
            totals,
        })
    }

    /// Replace the whole state with a new snapshot.
    ///
    /// The previous state is kept if the snapshot does not validate.
    pub fn reload(&mut self, snapshot: Snapshot) -> EngineResult<()> {
        *self = Self::setup(snapshot)?;
        Ok(())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Read-only Views
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Number of processes (`n`), terminated ones included
    pub fn process_count(&self) -> usize {
        self.process_names.len()
    }

    /// Number of resource types (`m`)
    pub fn resource_count(&self) -> usize {
        self.resource_names.len()
    }

    /// Process display names in index order
    pub fn process_names(&self) -> &[String] {
        &self.process_names
    }

    /// Resource type display names in index order
    pub fn resource_names(&self) -> &[String] {
        &self.resource_names
    }

    /// Display name of a process
    pub fn process_name(&self, process: ProcessId) -> EngineResult<&str> {
        self.check_process(process)?;
        Ok(&self.process_names[process.0])
    }

    /// Display name of a resource type
    pub fn resource_name(&self, resource: ResourceTypeId) -> Option<&str> {
        self.resource_names.get(resource.0).map(String::as_str)
    }

    /// `allocation[i][j]`
    pub fn allocation(&self) -> &[Vec<Units>] {
        &self.allocation
    }

    /// `max_demand[i][j]`
    pub fn max_demand(&self) -> &[Vec<Units>] {
        &self.max_demand
    }

    /// `available[j]`
    pub fn available(&self) -> &[Units] {
        &self.available
    }

    /// Termination flag per process
    pub fn terminated(&self) -> &[bool] {
        &self.terminated
    }

    /// Units of each type in the system, fixed at setup
    pub fn totals(&self) -> &[Units] {
        &self.totals
    }

    /// Whether a process has been terminated. Unknown ids read as `false`.
    pub fn is_terminated(&self, process: ProcessId) -> bool {
        self.terminated.get(process.0).copied().unwrap_or(false)
    }

    /// Live (non-terminated) processes in index order
    pub fn live_processes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.terminated
            .iter()
            .enumerate()
            .filter(|(_, &dead)| !dead)
            .map(|(i, _)| ProcessId(i))
    }

    /// `max_demand - allocation`, element-wise.
    ///
    /// Saturates at zero: the optimistic `grant` may push a process past its
    /// declared maximum, and such a process simply needs nothing more.
    pub fn need(&self) -> Vec<Vec<Units>> {
        (0..self.process_count())
            .map(|i| self.need_row(i))
            .collect()
    }

    /// Need vector of a single process
    pub fn need_of(&self, process: ProcessId) -> EngineResult<Vec<Units>> {
        self.check_process(process)?;
        Ok(self.need_row(process.0))
    }

    /// Total units of all types held by a process.
    ///
    /// Widened to `u128`: totals are only bounded per resource type, so a
    /// single row may sum past `u64::MAX`.
    pub fn held_total(&self, process: ProcessId) -> EngineResult<u128> {
        self.check_process(process)?;
        Ok(self.allocation[process.0].iter().map(|&u| u128::from(u)).sum())
    }

    /// Whether `available + Σ allocation` still equals the setup totals
    pub fn is_conserved(&self) -> bool {
        (0..self.resource_count()).all(|j| {
            let held: Units = self.allocation.iter().map(|row| row[j]).sum();
            self.available[j] + held == self.totals[j]
        })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Name Resolution
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Resolve a process by exact, case-sensitive name
    pub fn index_of(&self, name: &str) -> EngineResult<ProcessId> {
        self.process_names
            .iter()
            .position(|p| p == name)
            .map(ProcessId)
            .ok_or_else(|| EngineError::ProcessNotFound(name.to_string()))
    }

    /// Resolve a resource type by exact, case-sensitive name
    pub fn resource_index_of(&self, name: &str) -> EngineResult<ResourceTypeId> {
        self.resource_names
            .iter()
            .position(|r| r == name)
            .map(ResourceTypeId)
            .ok_or_else(|| EngineError::ResourceNotFound(name.to_string()))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Validation Helpers
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub(crate) fn need_row(&self, i: usize) -> Vec<Units> {
        self.max_demand[i]
            .iter()
            .zip(&self.allocation[i])
            .map(|(&mx, &a)| mx.saturating_sub(a))
            .collect()
    }

    /// Fails unless `process` is in `0..n`
    pub(crate) fn check_process(&self, process: ProcessId) -> EngineResult<()> {
        if process.0 < self.process_count() {
            Ok(())
        } else {
            Err(EngineError::InvalidProcessId {
                id: process,
                count: self.process_count(),
            })
        }
    }

    /// Fails unless `process` is in range and not terminated
    pub(crate) fn check_live(&self, process: ProcessId) -> EngineResult<()> {
        self.check_process(process)?;
        if self.terminated[process.0] {
            return Err(EngineError::ProcessTerminated(process));
        }
        Ok(())
    }

    /// Fails unless `vector` has one entry per resource type
    pub(crate) fn check_vector(&self, vector: &[Units]) -> EngineResult<()> {
        if vector.len() == self.resource_count() {
            Ok(())
        } else {
            Err(ShapeError::VectorLength {
                expected: self.resource_count(),
                found: vector.len(),
            }
            .into())
        }
    }
}

fn ensure_unique(names: &[String]) -> Result<(), ShapeError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ShapeError::DuplicateName(name.clone()));
        }
    }
    Ok(())
}

fn non_negative(matrix: MatrixKind, row: usize, col: usize, value: i64) -> Result<Units, ShapeError> {
    Units::try_from(value).map_err(|_| ShapeError::NegativeEntry {
        matrix,
        row,
        col,
        value,
    })
}

fn to_units(
    matrix: MatrixKind,
    rows: &[Vec<i64>],
    n: usize,
    m: usize,
) -> Result<Vec<Vec<Units>>, ShapeError> {
    if rows.len() != n {
        return Err(ShapeError::RowCount {
            matrix,
            expected: n,
            found: rows.len(),
        });
    }
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() != m {
                return Err(ShapeError::ColumnCount {
                    matrix,
                    row: i,
                    expected: m,
                    found: row.len(),
                });
            }
            row.iter()
                .enumerate()
                .map(|(j, &value)| non_negative(matrix, i, j, value))
                .collect()
        })
        .collect()
}
