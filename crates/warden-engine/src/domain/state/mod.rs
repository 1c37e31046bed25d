//! Resource State Data Model
//!
//! `n` processes and `m` resource types, both fixed at setup. Processes are
//! never removed; termination is a flag so indices stay stable.
//!
//! | Quantity        | Shape   | Stored |
//! |-----------------|---------|--------|
//! | allocation      | `n × m` | yes    |
//! | max_demand      | `n × m` | yes    |
//! | available       | `m`     | yes    |
//! | terminated      | `n`     | yes    |
//! | need            | `n × m` | derived (`max_demand - allocation`) |

pub mod model;
pub mod types;

pub use model::ResourceState;
pub use types::{MatrixKind, ProcessId, ResourceTypeId, Snapshot, Units};

pub use crate::domain::error::ShapeError;
