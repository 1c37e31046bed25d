//! Graphviz DOT rendering of an [`AllocationGraph`]
//!
//! Processes are circles (red when deadlocked), resource types are boxes.
//! Assignment edges are solid, request edges dashed; both are labelled with
//! their unit count when it exceeds one. Layout is left to Graphviz.

use std::fmt::{self, Display, Formatter};

use crate::domain::{AllocationGraph, EdgeKind, NodeId};

const DEADLOCKED_FILL: &str = "red";
const PROCESS_FILL: &str = "skyblue";
const RESOURCE_FILL: &str = "lightgreen";

/// DOT exporter; `to_string()` yields a `digraph` document
pub struct Dot<'a>(&'a AllocationGraph);

impl<'a> Dot<'a> {
    /// Wrap a projected graph for rendering
    pub fn new(graph: &'a AllocationGraph) -> Self {
        Self(graph)
    }
}

impl Display for Dot<'_> {
    fn fmt(&self, out: &mut Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        writeln!(out, "digraph rag {{")?;
        writeln!(out, "    rankdir=LR;")?;
        writeln!(out, "    node [style=filled, fontname=\"Helvetica\"];")?;

        for p in &graph.processes {
            let fill = if p.deadlocked { DEADLOCKED_FILL } else { PROCESS_FILL };
            writeln!(
                out,
                "    {} [label=\"{}\", shape=circle, fillcolor={}];",
                node_key(NodeId::Process(p.id)),
                escape(&p.name),
                fill
            )?;
        }
        for r in &graph.resources {
            writeln!(
                out,
                "    {} [label=\"{}\", shape=box, fillcolor={}];",
                node_key(NodeId::Resource(r.id)),
                escape(&r.name),
                RESOURCE_FILL
            )?;
        }

        for e in &graph.edges {
            let style = match e.kind {
                EdgeKind::Assignment => "solid",
                EdgeKind::Request => "dashed",
            };
            write!(
                out,
                "    {} -> {} [style={}",
                node_key(e.from),
                node_key(e.to),
                style
            )?;
            if e.units > 1 {
                write!(out, ", label=\"{}\"", e.units)?;
            }
            writeln!(out, "];")?;
        }

        writeln!(out, "}}")
    }
}

/// Node keys are index based so arbitrary display names stay legal
fn node_key(node: NodeId) -> String {
    match node {
        NodeId::Process(p) => format!("p{}", p.as_usize()),
        NodeId::Resource(r) => format!("r{}", r.as_usize()),
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GraphProjector, ResourceState, Snapshot};

    fn graph() -> AllocationGraph {
        let state = ResourceState::setup(Snapshot::new(
            vec!["P\"0".into(), "P1".into()],
            vec!["R0".into()],
            vec![vec![2], vec![0]],
            vec![vec![2], vec![1]],
            vec![0],
        ))
        .unwrap();
        let c = state.classify();
        GraphProjector::project(&state, &c.deadlocked)
    }

    #[test]
    fn test_render_nodes_and_edges() {
        let dot = Dot::new(&graph()).to_string();
        assert!(dot.starts_with("digraph rag {"));
        assert!(dot.trim_end().ends_with('}'));
        assert!(dot.contains("p0 [label=\"P\\\"0\", shape=circle, fillcolor=skyblue];"));
        assert!(dot.contains("r0 [label=\"R0\", shape=box"));
        assert!(dot.contains("r0 -> p0 [style=solid, label=\"2\"];"));
        assert!(dot.contains("p1 -> r0 [style=dashed];"));
    }

    #[test]
    fn test_display_writes_into_any_formatter() {
        let g = graph();
        let framed = format!("// rag\n{}", Dot::new(&g));
        assert!(framed.starts_with("// rag\ndigraph rag {"));
        assert_eq!(framed.len(), "// rag\n".len() + Dot::new(&g).to_string().len());
    }

    #[test]
    fn test_render_marks_deadlocked() {
        let mut g = graph();
        g.processes[1].deadlocked = true;
        let dot = Dot::new(&g).to_string();
        assert!(dot.contains("p1 [label=\"P1\", shape=circle, fillcolor=red];"));
    }
}
