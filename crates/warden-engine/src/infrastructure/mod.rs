//! # Infrastructure Layer
//!
//! File formats feeding the engine. The engine itself never reads files;
//! this layer turns a scenario document into setup input.

pub mod scenario;

pub use scenario::{Scenario, ScenarioError, ScenarioEvent};
