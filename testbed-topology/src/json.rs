//! JSON exchange format for topology graphs
//!
//! The document stores every node/edge attribute as a string. Numeric
//! semantics are a consumer concern: whatever needs a bandwidth as a number
//! reparses it after loading.

use crate::graph::TopologyGraph;
use crate::{Attrs, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct TopologyJson {
    name: String,
    nodes: Vec<NodeJson>,
    edges: Vec<EdgeJson>,
}

#[derive(Serialize, Deserialize)]
struct NodeJson {
    id: String,
    #[serde(default)]
    attributes: Attrs,
}

#[derive(Serialize, Deserialize)]
struct EdgeJson {
    source: String,
    target: String,
    #[serde(default)]
    attributes: Attrs,
}

impl From<&TopologyGraph> for TopologyJson {
    fn from(graph: &TopologyGraph) -> Self {
        Self {
            name: graph.name().to_string(),
            nodes: graph
                .nodes()
                .map(|n| NodeJson {
                    id: n.id.clone(),
                    attributes: n.attrs.clone(),
                })
                .collect(),
            edges: graph
                .edges()
                .map(|e| EdgeJson {
                    source: e.source.clone(),
                    target: e.target.clone(),
                    attributes: e.attrs.clone(),
                })
                .collect(),
        }
    }
}

/// Serializes the graph to `path`. Pretty-printing has no effect on read
/// semantics.
pub fn write_graph(
    graph: &TopologyGraph,
    path: &Path,
    pretty: bool,
) -> Result<(), TopologyError> {
    let doc = TopologyJson::from(graph);
    let bytes = if pretty {
        serde_json::to_vec_pretty(&doc)?
    } else {
        serde_json::to_vec(&doc)?
    };
    fs::write(path, bytes)?;
    Ok(())
}

/// Deserializes a graph from `path`.
///
/// With `relabel`, node identifiers are remapped to the format-native `n0`,
/// `n1`, … scheme. The launch layer looks devices up by their original ids,
/// so it always loads with `relabel = false`.
pub fn read_graph(path: &Path, relabel: bool) -> Result<TopologyGraph, TopologyError> {
    let bytes = fs::read(path)?;
    let mut doc: TopologyJson = serde_json::from_slice(&bytes)?;
    if relabel {
        relabel_nodes(&mut doc);
    }

    let mut graph = TopologyGraph::new(doc.name);
    for node in doc.nodes {
        graph.add_node(&node.id, node.attributes)?;
    }
    for edge in doc.edges {
        graph.add_edge(&edge.source, &edge.target, edge.attributes)?;
    }
    Ok(graph)
}

fn relabel_nodes(doc: &mut TopologyJson) {
    let mapping: HashMap<String, String> = doc
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), format!("n{index}")))
        .collect();

    for node in &mut doc.nodes {
        if let Some(new_id) = mapping.get(&node.id) {
            node.id = new_id.clone();
        }
    }
    for edge in &mut doc.edges {
        if let Some(new_source) = mapping.get(&edge.source) {
            edge.source = new_source.clone();
        }
        if let Some(new_target) = mapping.get(&edge.target) {
            edge.target = new_target.clone();
        }
    }
}
