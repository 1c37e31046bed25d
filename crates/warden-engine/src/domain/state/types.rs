//! Core Types for the Resource State Engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource units. Resources are fungible, so a count is all that is tracked.
pub type Units = u64;

/// Process identifier (stable index `0..n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub usize);

impl ProcessId {
    /// Create a new process identifier
    #[inline(always)]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying index
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Resource type identifier (stable index `0..m`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTypeId(pub usize);

impl ResourceTypeId {
    /// Create a new resource type identifier
    #[inline(always)]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying index
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Which matrix or vector a setup entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    /// Units currently held
    Allocation,
    /// Declared maximum demand
    MaxDemand,
    /// Unallocated units
    Available,
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation => write!(f, "allocation"),
            Self::MaxDemand => write!(f, "max_demand"),
            Self::Available => write!(f, "available"),
        }
    }
}

/// Raw setup input as supplied by an input collaborator.
///
/// Entries are signed so that negative input can be rejected with a
/// [`ShapeError`](super::ShapeError) instead of being unrepresentable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Process display names, one per allocation row
    pub process_names: Vec<String>,
    /// Resource type display names, one per column
    pub resource_names: Vec<String>,
    /// `allocation[i][j]`: units of type `j` held by process `i`
    pub allocation: Vec<Vec<i64>>,
    /// `max_demand[i][j]`: most units of type `j` process `i` may hold
    pub max_demand: Vec<Vec<i64>>,
    /// `available[j]`: unallocated units of type `j`
    pub available: Vec<i64>,
}

impl Snapshot {
    /// Bundle the five setup inputs
    pub fn new(
        process_names: Vec<String>,
        resource_names: Vec<String>,
        allocation: Vec<Vec<i64>>,
        max_demand: Vec<Vec<i64>>,
        available: Vec<i64>,
    ) -> Self {
        Self {
            process_names,
            resource_names,
            allocation,
            max_demand,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_creation() {
        let pid = ProcessId::new(3);
        assert_eq!(pid.as_usize(), 3);
        assert_eq!(format!("{}", pid), "p3");
    }

    #[test]
    fn test_resource_type_id_creation() {
        let rid = ResourceTypeId::new(1);
        assert_eq!(rid.as_usize(), 1);
        assert_eq!(format!("{}", rid), "r1");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&ProcessId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: ResourceTypeId = serde_json::from_str("2").unwrap();
        assert_eq!(back, ResourceTypeId::new(2));
    }
}
