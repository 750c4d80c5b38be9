use crate::device::{DeviceRole, DeviceSpec};
use crate::link::LinkSpec;
use crate::{Attrs, TopologyError};

/// A named topology graph: nodes keyed by device id, undirected edges keyed
/// by their endpoint pair, both carrying string attribute mappings.
///
/// Insertion order is preserved. The blueprint builders rely on it for their
/// per-phase node-count checks, and the serializer relies on it for stable
/// output.
#[derive(Clone, Debug, PartialEq)]
pub struct TopologyGraph {
    name: String,
    nodes: Vec<NodeEntry>,
    edges: Vec<EdgeEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeEntry {
    pub id: String,
    pub attrs: Attrs,
}

impl NodeEntry {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// The device role, parsed back from its attribute tag.
    pub fn role(&self) -> Option<DeviceRole> {
        self.attr("role").and_then(|role| role.parse().ok())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeEntry {
    pub source: String,
    pub target: String,
    pub attrs: Attrs,
}

impl EdgeEntry {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

impl TopologyGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_device(&mut self, device: &DeviceSpec) -> Result<(), TopologyError> {
        self.add_node(device.id(), device.attributes())
    }

    pub fn add_node(&mut self, id: &str, attrs: Attrs) -> Result<(), TopologyError> {
        if self.contains_node(id) {
            return Err(TopologyError::DuplicateDevice(id.to_string()));
        }
        // Addresses and MACs are unique per topology
        for key in ["address", "mac"] {
            if let Some(value) = attrs.get(key) {
                if self.nodes.iter().any(|n| n.attr(key) == Some(value)) {
                    return Err(TopologyError::InvariantViolation(format!(
                        "{key} `{value}` is assigned to more than one device"
                    )));
                }
            }
        }
        self.nodes.push(NodeEntry {
            id: id.to_string(),
            attrs,
        });
        Ok(())
    }

    pub fn add_link(&mut self, a: &str, b: &str, link: &LinkSpec) -> Result<(), TopologyError> {
        self.add_edge(a, b, link.attributes())
    }

    pub fn add_edge(&mut self, a: &str, b: &str, attrs: Attrs) -> Result<(), TopologyError> {
        for endpoint in [a, b] {
            if !self.contains_node(endpoint) {
                return Err(TopologyError::UnknownDevice(endpoint.to_string()));
            }
        }
        self.edges.push(EdgeEntry {
            source: a.to_string(),
            target: b.to_string(),
            attrs,
        });
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&NodeEntry> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeEntry> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeEntry> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        self.edges.iter().any(|e| e.connects(a, b))
    }

    /// Number of edges touching the given node.
    pub fn degree(&self, id: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceRole;

    fn plc(id: &str, last_octet: u8) -> DeviceSpec {
        DeviceSpec::host(
            id,
            DeviceRole::Controller,
            &format!("192.168.1.{last_octet}"),
            "255.255.255.0",
            &format!("00:1d:9c:c7:b0:{last_octet:02x}"),
        )
        .unwrap()
    }

    #[test]
    fn duplicate_device_id_is_rejected() {
        let mut graph = TopologyGraph::new("t");
        graph.add_device(&plc("plc1", 10)).unwrap();
        let result = graph.add_device(&plc("plc1", 11));
        assert!(matches!(result, Err(TopologyError::DuplicateDevice(id)) if id == "plc1"));
    }

    #[test]
    fn duplicate_address_is_rejected() {
        let mut graph = TopologyGraph::new("t");
        graph.add_device(&plc("plc1", 10)).unwrap();
        let clashing = DeviceSpec::host(
            "plc2",
            DeviceRole::Controller,
            "192.168.1.10",
            "255.255.255.0",
            "00:1d:9c:c7:b0:02",
        )
        .unwrap();
        let result = graph.add_device(&clashing);
        assert!(matches!(result, Err(TopologyError::InvariantViolation(_))));
    }

    #[test]
    fn edge_with_unknown_endpoint_is_rejected() {
        let mut graph = TopologyGraph::new("t");
        graph.add_device(&plc("plc1", 10)).unwrap();
        let link = LinkSpec::new("0", 30.0, 0.0, 0.0).unwrap();
        let result = graph.add_link("plc1", "s3", &link);
        assert!(matches!(result, Err(TopologyError::UnknownDevice(id)) if id == "s3"));
    }

    #[test]
    fn contains_edge_is_order_insensitive() {
        let mut graph = TopologyGraph::new("t");
        graph.add_device(&DeviceSpec::switch("s3")).unwrap();
        graph.add_device(&plc("plc1", 10)).unwrap();
        let link = LinkSpec::new("0", 30.0, 0.0, 0.0).unwrap();
        graph.add_link("plc1", "s3", &link).unwrap();

        assert!(graph.contains_edge("plc1", "s3"));
        assert!(graph.contains_edge("s3", "plc1"));
        assert!(!graph.contains_edge("s3", "plc2"));
    }

    #[test]
    fn node_views_parse_roles() {
        let mut graph = TopologyGraph::new("t");
        graph.add_device(&DeviceSpec::switch("s3")).unwrap();
        graph.add_device(&plc("plc1", 10)).unwrap();

        assert_eq!(graph.node("s3").unwrap().role(), Some(DeviceRole::Switch));
        assert_eq!(
            graph.node("plc1").unwrap().role(),
            Some(DeviceRole::Controller)
        );
        assert_eq!(graph.node("plc1").unwrap().attr("address"), Some("192.168.1.10"));
    }
}
