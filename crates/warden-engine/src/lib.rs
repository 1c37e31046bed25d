//! Warden Resource State Engine
//!
//! # Overview
//!
//! `warden-engine` models resource allocation among a fixed set of processes
//! and resource types, and decides at any point whether the system is SAFE
//! (every process can eventually complete) or DEADLOCKED (some subset never
//! can). It recovers by terminating processes and returning their units to
//! the pool.
//!
//! # Trinity Architecture
//!
//! - **Domain**: state model, safety check, request protocol, recovery,
//!   graph projection. Pure and synchronous.
//! - **Infrastructure**: scenario file loading
//! - **Adapters**: DOT export, event replay, shared handle
//!
//! # Engine Laws (Invariants)
//!
//! - **Conservation**: `available[j] + Σ_i allocation[i][j]` never changes
//!   after setup
//! - **Bounded holdings**: `allocation <= max_demand` for live processes at
//!   setup; only the optimistic `grant` may exceed it, by caller choice
//! - **Stable indices**: termination is a flag, processes are never removed
//! - **Validate then apply**: failed operations leave state untouched
//!
//! # Usage
//!
//! ```rust
//! use warden_engine::{RequestProtocol, ResourceState, ProcessId, Snapshot};
//!
//! let mut state = ResourceState::setup(Snapshot::new(
//!     vec!["P0".into(), "P1".into()],
//!     vec!["CPU".into(), "DISK".into()],
//!     vec![vec![1, 0], vec![0, 1]],
//!     vec![vec![2, 1], vec![1, 2]],
//!     vec![1, 1],
//! ))
//! .unwrap();
//!
//! let c = state.classify();
//! assert!(c.is_safe());
//! assert_eq!(c.completion_order, vec![ProcessId(0), ProcessId(1)]);
//!
//! state.grant(ProcessId(1), &[1, 1]).unwrap();
//! assert!(state.is_conserved());
//! ```
//!
//! # Concurrency
//!
//! Single caller, synchronous, no internal locking. Multi-threaded hosts
//! must serialize access, e.g. through [`adapters::SharedState`].

#![warn(missing_docs)]
#![warn(clippy::all)]

// Trinity Architecture Layers
pub mod adapters;
pub mod domain;
pub mod infrastructure;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Re-export Primary Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// State types
pub use domain::{MatrixKind, ProcessId, ResourceState, ResourceTypeId, Snapshot, Units};

// Errors
pub use domain::{EngineError, EngineResult, ErrorKind, ShapeError};

// Components
pub use domain::{
    AllocationGraph, Classification, GraphProjector, RecoveryConfig, RecoveryLog,
    RecoveryManager, RequestOutcome, RequestProtocol, SafetyChecker, Victim,
};

// Scenario loading
pub use infrastructure::{Scenario, ScenarioError, ScenarioEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
