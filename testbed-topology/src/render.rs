//! Static Graphviz export
//!
//! Write-only: the rendered document is never read back, and skipping the
//! render has no effect on launch behavior.

use crate::TopologyError;
use crate::device::DeviceRole;
use crate::graph::TopologyGraph;
use std::fs;
use std::path::Path;

/// Renders the graph as a Graphviz DOT document at `path`.
pub fn render_dot(graph: &TopologyGraph, path: &Path) -> Result<(), TopologyError> {
    fs::write(path, to_dot(graph))?;
    Ok(())
}

fn to_dot(graph: &TopologyGraph) -> String {
    let mut out = String::new();
    out.push_str(&format!("graph \"{}\" {{\n", graph.name()));

    for node in graph.nodes() {
        let shape = match node.role() {
            Some(DeviceRole::Switch) => "box",
            _ => "ellipse",
        };
        let label = match node.attr("address") {
            Some(address) => format!("{}\\n{address}", node.id),
            None => node.id.clone(),
        };
        out.push_str(&format!(
            "    \"{}\" [shape={shape}, label=\"{label}\"];\n",
            node.id
        ));
    }

    for edge in graph.edges() {
        let label = edge
            .attr("bandwidth")
            .map(|bandwidth| format!(" [label=\"{bandwidth} Mbps\"]"))
            .unwrap_or_default();
        out.push_str(&format!(
            "    \"{}\" -- \"{}\"{label};\n",
            edge.source, edge.target
        ));
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint;

    #[test]
    fn dot_output_contains_every_node_and_edge() {
        let graph = blueprint::build("level1", true).unwrap();
        let dot = to_dot(&graph);

        assert!(dot.starts_with("graph \"level1\" {"));
        assert!(dot.contains("\"s3\" [shape=box, label=\"s3\"];"));
        assert!(dot.contains("\"plc1\" [shape=ellipse, label=\"plc1\\n192.168.1.10\"];"));
        assert!(dot.contains("\"attacker\" -- \"s3\" [label=\"30 Mbps\"];"));
        assert_eq!(dot.matches(" -- ").count(), graph.edge_count());
    }

    #[test]
    fn rendering_writes_a_file_and_leaves_the_graph_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level1.dot");

        let graph = blueprint::build("level1", false).unwrap();
        let before = graph.clone();
        render_dot(&graph, &path).unwrap();

        assert_eq!(graph, before);
        assert!(fs::read_to_string(&path).unwrap().contains("\"plc6\""));
    }
}
