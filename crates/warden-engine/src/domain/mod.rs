//! # Domain Layer
//!
//! Pure engine logic. Nothing here performs I/O.
//!
//! ## Components
//!
//! - [`state`]: `ResourceState`, the single source of truth
//! - [`safety`]: `SafetyChecker`, Banker's safety classification
//! - [`protocol`]: `RequestProtocol`, incremental grant/release
//! - [`recovery`]: `RecoveryManager`, termination and victim selection
//! - [`graph`]: `GraphProjector`, resource allocation graph edges
//!
//! ## Data Flow
//!
//! ```text
//! setup ──▶ ResourceState ──▶ classify ──▶ safe? ──yes──▶ done
//!              ▲    ▲                        │
//!              │    │                        no
//!   grant/release   └──── terminate ◀── auto_recover
//! ```
//!
//! ## Example
//!
//! ```
//! use warden_engine::domain::{ResourceState, Snapshot, RecoveryManager};
//!
//! let mut state = ResourceState::setup(Snapshot::new(
//!     vec!["P0".into(), "P1".into()],
//!     vec!["R0".into()],
//!     vec![vec![1], vec![1]],
//!     vec![vec![2], vec![2]],
//!     vec![0],
//! ))
//! .unwrap();
//!
//! let classification = state.classify();
//! assert!(!classification.is_safe());
//!
//! let victim = RecoveryManager::auto_recover(&mut state, &classification.deadlocked)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(victim.name, "P0");
//! assert!(state.classify().is_safe());
//! ```

pub mod error;
pub mod graph;
pub mod protocol;
pub mod recovery;
pub mod safety;
pub mod state;

pub use error::{EngineError, EngineResult, ErrorKind, ShapeError};
pub use graph::{AllocationGraph, Edge, EdgeKind, GraphProjector, NodeId, ProcessNode, ResourceNode};
pub use protocol::{RequestOutcome, RequestProtocol};
pub use recovery::{RecoveryConfig, RecoveryLog, RecoveryManager, Victim};
pub use safety::{Classification, SafetyChecker};
pub use state::{MatrixKind, ProcessId, ResourceState, ResourceTypeId, Snapshot, Units};
