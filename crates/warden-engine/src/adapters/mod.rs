//! # Adapters Layer
//!
//! Bridges between the engine and its collaborators:
//!
//! - [`dot`]: Graphviz rendering of the allocation graph
//! - [`replay`]: scripted event replay by process name
//! - [`shared`]: mutex-guarded handle for multi-threaded hosts

pub mod dot;
pub mod replay;
pub mod shared;

pub use dot::Dot;
pub use replay::{ReplayStep, Replayer, StepEffect};
pub use shared::SharedState;
