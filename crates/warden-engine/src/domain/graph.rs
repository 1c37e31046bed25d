//! Graph Projector - Resource Allocation Graph
//!
//! Projects a state onto a directed graph for an external renderer:
//!
//! - `r → p` (assignment) when process `p` holds units of `r`
//! - `p → r` (request) when process `p` still needs units of `r`
//!
//! Terminated processes are left out entirely. Process nodes carry a
//! `deadlocked` flag so the renderer can color them. The projection never
//! touches the state.

use serde::Serialize;

use super::state::{ProcessId, ResourceState, ResourceTypeId, Units};

/// Graph node identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "index", rename_all = "snake_case")]
pub enum NodeId {
    /// A process node
    Process(ProcessId),
    /// A resource type node
    Resource(ResourceTypeId),
}

/// Process node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessNode {
    /// Process index
    pub id: ProcessId,
    /// Display name
    pub name: String,
    /// Member of the deadlocked set passed to the projector
    pub deadlocked: bool,
}

/// Resource type node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceNode {
    /// Resource type index
    pub id: ResourceTypeId,
    /// Display name
    pub name: String,
}

/// Edge direction semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Resource → process: units currently held
    Assignment,
    /// Process → resource: outstanding need
    Request,
}

/// Directed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    /// Tail node
    pub from: NodeId,
    /// Head node
    pub to: NodeId,
    /// Assignment or request
    pub kind: EdgeKind,
    /// Units held (assignment) or still needed (request)
    pub units: Units,
}

/// Resource allocation graph
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AllocationGraph {
    /// Live processes in index order
    pub processes: Vec<ProcessNode>,
    /// All resource types in index order
    pub resources: Vec<ResourceNode>,
    /// Edges, grouped by process then resource, assignment before request
    pub edges: Vec<Edge>,
}

impl AllocationGraph {
    /// Display name of a node
    pub fn label(&self, node: NodeId) -> Option<&str> {
        match node {
            NodeId::Process(p) => self
                .processes
                .iter()
                .find(|n| n.id == p)
                .map(|n| n.name.as_str()),
            NodeId::Resource(r) => self
                .resources
                .iter()
                .find(|n| n.id == r)
                .map(|n| n.name.as_str()),
        }
    }

    /// Edges of one kind
    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Stateless state-to-graph projection
pub struct GraphProjector;

impl GraphProjector {
    /// Project `state` with `deadlocked` marking process nodes
    pub fn project(state: &ResourceState, deadlocked: &[ProcessId]) -> AllocationGraph {
        let need = state.need();

        let processes = state
            .live_processes()
            .map(|p| ProcessNode {
                id: p,
                name: state.process_names()[p.0].clone(),
                deadlocked: deadlocked.contains(&p),
            })
            .collect();

        let resources = state
            .resource_names()
            .iter()
            .enumerate()
            .map(|(j, name)| ResourceNode {
                id: ResourceTypeId(j),
                name: name.clone(),
            })
            .collect();

        let mut edges = Vec::new();
        for p in state.live_processes() {
            for j in 0..state.resource_count() {
                let r = ResourceTypeId(j);
                let held = state.allocation()[p.0][j];
                if held > 0 {
                    edges.push(Edge {
                        from: NodeId::Resource(r),
                        to: NodeId::Process(p),
                        kind: EdgeKind::Assignment,
                        units: held,
                    });
                }
                let wanted = need[p.0][j];
                if wanted > 0 {
                    edges.push(Edge {
                        from: NodeId::Process(p),
                        to: NodeId::Resource(r),
                        kind: EdgeKind::Request,
                        units: wanted,
                    });
                }
            }
        }

        AllocationGraph {
            processes,
            resources,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Snapshot;

    fn sample() -> ResourceState {
        ResourceState::setup(Snapshot::new(
            vec!["P0".into(), "P1".into()],
            vec!["R0".into(), "R1".into()],
            vec![vec![1, 0], vec![0, 1]],
            vec![vec![1, 1], vec![2, 1]],
            vec![0, 0],
        ))
        .unwrap()
    }

    #[test]
    fn test_edges_follow_allocation_and_need() {
        let s = sample();
        let c = s.classify();
        let g = GraphProjector::project(&s, &c.deadlocked);

        assert_eq!(g.processes.len(), 2);
        assert_eq!(g.resources.len(), 2);
        assert!(g.processes.iter().all(|p| p.deadlocked));

        let p0 = NodeId::Process(ProcessId(0));
        let p1 = NodeId::Process(ProcessId(1));
        let r0 = NodeId::Resource(ResourceTypeId(0));
        let r1 = NodeId::Resource(ResourceTypeId(1));
        let pairs: Vec<(NodeId, NodeId, Units)> =
            g.edges.iter().map(|e| (e.from, e.to, e.units)).collect();
        assert_eq!(pairs, vec![(r0, p0, 1), (p0, r1, 1), (p1, r0, 2), (r1, p1, 1)]);

        assert_eq!(g.edges_of(EdgeKind::Assignment).count(), 2);
        assert_eq!(g.edges_of(EdgeKind::Request).count(), 2);
        assert_eq!(g.label(r1), Some("R1"));
    }

    #[test]
    fn test_terminated_process_is_omitted() {
        let mut s = sample();
        s.terminate_process(ProcessId(0)).unwrap();
        let g = GraphProjector::project(&s, &[]);
        assert_eq!(g.processes.len(), 1);
        assert_eq!(g.processes[0].name, "P1");
        assert!(!g.processes[0].deadlocked);
        assert!(g
            .edges
            .iter()
            .all(|e| e.from != NodeId::Process(ProcessId(0)) && e.to != NodeId::Process(ProcessId(0))));
        assert_eq!(g.label(NodeId::Process(ProcessId(0))), None);
    }

    #[test]
    fn test_projection_does_not_mutate() {
        let s = sample();
        let before = s.clone();
        let _ = GraphProjector::project(&s, &[ProcessId(1)]);
        assert_eq!(s, before);
    }

    #[test]
    fn test_json_shape() {
        let g = GraphProjector::project(&sample(), &[ProcessId(1)]);
        let value: serde_json::Value = serde_json::from_str(&g.to_json().unwrap()).unwrap();
        assert_eq!(value["processes"][1]["deadlocked"], true);
        assert_eq!(value["edges"][0]["kind"], "assignment");
        assert_eq!(value["edges"][0]["from"]["type"], "resource");
        assert_eq!(value["edges"][0]["from"]["index"], 0);
    }
}
