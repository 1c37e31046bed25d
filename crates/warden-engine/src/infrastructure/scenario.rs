//! Scenario Files
//!
//! JSON description of an initial state plus an optional event script.
//!
//! ```json
//! {
//!   "processes": ["P0", "P1"],
//!   "resources": ["R0"],
//!   "allocation": [[1], [0]],
//!   "max_demand": [[2], [1]],
//!   "available": [0],
//!   "events": [
//!     { "op": "grant", "process": "P1", "units": [0] },
//!     { "op": "auto_recover" }
//!   ]
//! }
//! ```
//!
//! Name lists are optional. Missing or blank names default to `P{i}` and
//! `R{j}`, sized from the allocation rows and the available vector.
//! Matrix entries are signed so negative input surfaces as a shape error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{EngineError, ResourceState, Snapshot, Units};

/// Errors while loading a scenario
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// File could not be read
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid scenario document
    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Scenario describes an invalid state
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One scripted operation, addressed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScenarioEvent {
    /// Optimistic grant
    Grant {
        /// Process name
        process: String,
        /// Units per resource type
        units: Vec<Units>,
    },
    /// Release held units
    Release {
        /// Process name
        process: String,
        /// Units per resource type
        units: Vec<Units>,
    },
    /// Banker's request (refused if unsafe)
    Request {
        /// Process name
        process: String,
        /// Units per resource type
        units: Vec<Units>,
    },
    /// Terminate a process by name
    Terminate {
        /// Process name
        process: String,
    },
    /// Classify, then terminate the largest deadlocked holder
    AutoRecover,
    /// Classify the current state
    Classify,
}

/// Scenario document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Process names (optional)
    #[serde(default)]
    pub processes: Vec<String>,
    /// Resource type names (optional)
    #[serde(default)]
    pub resources: Vec<String>,
    /// Allocation matrix
    pub allocation: Vec<Vec<i64>>,
    /// Maximum demand matrix
    #[serde(alias = "max")]
    pub max_demand: Vec<Vec<i64>>,
    /// Available vector
    pub available: Vec<i64>,
    /// Scripted events, applied in order by the replayer
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    /// Parse a scenario from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a scenario file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), events = scenario.events.len(), "scenario loaded");
        Ok(scenario)
    }

    /// Setup input with default names filled in
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            fill_names(&self.processes, self.allocation.len(), "P"),
            fill_names(&self.resources, self.available.len(), "R"),
            self.allocation.clone(),
            self.max_demand.clone(),
            self.available.clone(),
        )
    }

    /// Validate and build the initial state
    pub fn build_state(&self) -> Result<ResourceState, ScenarioError> {
        Ok(ResourceState::setup(self.snapshot())?)
    }
}

/// An empty list becomes `count` generated names; blank entries in a given
/// list are replaced in place and every other name is kept byte for byte.
/// A non-empty list keeps its length so shape
/// validation can still reject it.
fn fill_names(names: &[String], count: usize, prefix: &str) -> Vec<String> {
    if names.is_empty() {
        return (0..count).map(|i| format!("{prefix}{i}")).collect();
    }
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if name.trim().is_empty() {
                format!("{prefix}{i}")
            } else {
                name.clone()
            }
        })
        .collect()
}
