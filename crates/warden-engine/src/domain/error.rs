//! Domain Model: Engine Error Types
//!
//! Every engine failure is local and synchronous. Operations validate before
//! they mutate, so a returned error always means the state is unchanged.

use super::state::{MatrixKind, ProcessId, ResourceTypeId, Units};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Shape Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Malformed setup or operation input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// A matrix has a different number of rows than there are processes
    #[error("{matrix} has {found} rows, expected {expected} (one per process)")]
    RowCount {
        matrix: MatrixKind,
        expected: usize,
        found: usize,
    },

    /// A matrix row has a different width than there are resource types
    #[error("{matrix} row {row} has {found} columns, expected {expected}")]
    ColumnCount {
        matrix: MatrixKind,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The available vector length disagrees with the resource type count
    #[error("available has {found} entries, expected {expected}")]
    AvailableLength { expected: usize, found: usize },

    /// A request or release vector length disagrees with the resource type count
    #[error("request vector has {found} entries, expected {expected}")]
    VectorLength { expected: usize, found: usize },

    /// Negative unit count
    #[error("{matrix}[{row}][{col}] is negative ({value})")]
    NegativeEntry {
        matrix: MatrixKind,
        row: usize,
        col: usize,
        value: i64,
    },

    /// Allocation exceeds the declared maximum
    #[error("process {process} holds {allocated} of {resource}, above its declared max {max}")]
    ExceedsMaxDemand {
        process: ProcessId,
        resource: ResourceTypeId,
        allocated: Units,
        max: Units,
    },

    /// A process or resource name appears twice
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// Total units of a resource type do not fit the unit counter
    #[error("total units of {0} overflow")]
    Overflow(ResourceTypeId),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Errors returned by engine operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Shape (1000-1099)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    /// Malformed input
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Not Found (2000-2099)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    /// No process has this name (case-sensitive)
    #[error("process not found: {0}")]
    ProcessNotFound(String),

    /// No resource type has this name (case-sensitive)
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Process index outside `0..n`
    #[error("invalid process id {id}: engine has {count} processes")]
    InvalidProcessId { id: ProcessId, count: usize },

    /// Process exists but has been terminated
    #[error("process {0} is terminated")]
    ProcessTerminated(ProcessId),

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Protocol (3000-3099)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    /// Request exceeds available units
    #[error("process {process} requested {requested} of {resource}, only {available} available")]
    OverAllocation {
        process: ProcessId,
        resource: ResourceTypeId,
        requested: Units,
        available: Units,
    },

    /// Release exceeds held units
    #[error("process {process} released {requested} of {resource}, but holds {held}")]
    Underflow {
        process: ProcessId,
        resource: ResourceTypeId,
        requested: Units,
        held: Units,
    },

    /// Request exceeds the process's remaining declared need
    #[error("process {process} requested {requested} of {resource}, above its remaining need {need}")]
    ExceedsDeclaredMax {
        process: ProcessId,
        resource: ResourceTypeId,
        requested: Units,
        need: Units,
    },

    /// Granting would leave processes unable to complete
    #[error("granting to process {process} would deadlock {deadlocked:?}")]
    UnsafeRequest {
        process: ProcessId,
        deadlocked: Vec<ProcessId>,
    },
}

/// Coarse error category for callers that branch on failure type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input
    Shape,
    /// Name or id does not resolve to a live entity
    NotFound,
    /// Request exceeds what is available or declared
    OverAllocation,
    /// Release exceeds held allocation
    Underflow,
    /// Grant refused by the safety check
    Unsafe,
}

impl EngineError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Shape(_) => ErrorKind::Shape,
            Self::ProcessNotFound(_)
            | Self::ResourceNotFound(_)
            | Self::InvalidProcessId { .. }
            | Self::ProcessTerminated(_) => ErrorKind::NotFound,
            Self::OverAllocation { .. } | Self::ExceedsDeclaredMax { .. } => {
                ErrorKind::OverAllocation
            }
            Self::Underflow { .. } => ErrorKind::Underflow,
            Self::UnsafeRequest { .. } => ErrorKind::Unsafe,
        }
    }

    /// Stable numeric code
    ///
    /// - 1000-1099: shape errors
    /// - 2000-2099: lookup errors
    /// - 3000-3099: protocol errors
    pub fn code(&self) -> u32 {
        match self {
            Self::Shape(_) => 1000,

            Self::ProcessNotFound(_) => 2001,
            Self::ResourceNotFound(_) => 2002,
            Self::InvalidProcessId { .. } => 2003,
            Self::ProcessTerminated(_) => 2004,

            Self::OverAllocation { .. } => 3001,
            Self::Underflow { .. } => 3002,
            Self::ExceedsDeclaredMax { .. } => 3003,
            Self::UnsafeRequest { .. } => 3004,
        }
    }
}

/// Engine result alias
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let shape = EngineError::from(ShapeError::DuplicateName("P0".into()));
        assert_eq!(shape.code(), 1000);
        assert_eq!(EngineError::ProcessNotFound("x".into()).code(), 2001);
        assert_eq!(
            EngineError::Underflow {
                process: ProcessId(0),
                resource: ResourceTypeId(0),
                requested: 2,
                held: 1,
            }
            .code(),
            3002
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            EngineError::ProcessTerminated(ProcessId(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::ExceedsDeclaredMax {
                process: ProcessId(0),
                resource: ResourceTypeId(1),
                requested: 3,
                need: 1,
            }
            .kind(),
            ErrorKind::OverAllocation
        );
        assert_eq!(
            EngineError::UnsafeRequest {
                process: ProcessId(0),
                deadlocked: vec![ProcessId(0)],
            }
            .kind(),
            ErrorKind::Unsafe
        );
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::OverAllocation {
            process: ProcessId(2),
            resource: ResourceTypeId(1),
            requested: 5,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("p2"));
        assert!(msg.contains("r1"));
        assert!(msg.contains("5"));
        assert!(msg.contains("3"));

        let shape = ShapeError::NegativeEntry {
            matrix: MatrixKind::MaxDemand,
            row: 1,
            col: 0,
            value: -4,
        };
        assert_eq!(shape.to_string(), "max_demand[1][0] is negative (-4)");
    }
}
