//! Named topology blueprints
//!
//! A blueprint assembles devices and links into a [`TopologyGraph`] following
//! a static, explicitly ordered address table. Construction order matters:
//! node-count checks run after each phase, so the table's iteration order is
//! part of the contract.

use crate::TopologyError;
use crate::device::{DeviceRole, DeviceSpec};
use crate::graph::TopologyGraph;
use crate::link::LinkSpec;

/// Hub switch of the level-1 plant network.
const HUB: &str = "s3";

const NETMASK: &str = "255.255.255.0";

/// Default shaping for plant links: 30 Mbps, no added delay, no loss.
const LINK_BANDWIDTH_MBPS: f64 = 30.0;

struct HostEntry {
    id: &'static str,
    role: DeviceRole,
    address: &'static str,
    mac: &'static str,
}

const fn host(
    id: &'static str,
    role: DeviceRole,
    address: &'static str,
    mac: &'static str,
) -> HostEntry {
    HostEntry {
        id,
        role,
        address,
        mac,
    }
}

/// Level-1 controllers, id suffix ascending.
const LEVEL1_CONTROLLERS: &[HostEntry] = &[
    host("plc1", DeviceRole::Controller, "192.168.1.10", "00:1d:9c:c7:b0:01"),
    host("plc2", DeviceRole::Controller, "192.168.1.20", "00:1d:9c:c7:b0:02"),
    host("plc3", DeviceRole::Controller, "192.168.1.30", "00:1d:9c:c7:b0:03"),
    host("plc4", DeviceRole::Controller, "192.168.1.40", "00:1d:9c:c7:b0:04"),
    host("plc5", DeviceRole::Controller, "192.168.1.50", "00:1d:9c:c7:b0:05"),
    host("plc6", DeviceRole::Controller, "192.168.1.60", "00:1d:9c:c7:b0:06"),
];

/// Supervision-level stations attached after the controller phase.
const LEVEL1_STATIONS: &[HostEntry] = &[
    host("hmi", DeviceRole::Hmi, "192.168.1.100", "00:1d:9c:c7:b0:10"),
    host("histn", DeviceRole::Historian, "192.168.1.200", "00:1d:9c:c7:b0:11"),
    host("workstn", DeviceRole::Workstation, "192.168.1.201", "00:1d:9c:c7:b0:12"),
];

const LEVEL1_ADVERSARY: HostEntry = host(
    "attacker",
    DeviceRole::Adversary,
    "192.168.1.77",
    "00:1d:9c:c7:b0:77",
);

/// Builds the named blueprint.
pub fn build(blueprint: &str, include_adversary: bool) -> Result<TopologyGraph, TopologyError> {
    match blueprint {
        "level1" => level1(include_adversary),
        other => Err(TopologyError::UnknownBlueprint(other.to_string())),
    }
}

/// Level-1 plant network: six PLCs in a star around the hub switch, plus HMI,
/// historian and workstation uplinks, plus an optional adversarial host.
pub fn level1(include_adversary: bool) -> Result<TopologyGraph, TopologyError> {
    let mut graph = TopologyGraph::new("level1");
    let mut next_link_id = 0u32;

    graph.add_device(&DeviceSpec::switch(HUB))?;

    for entry in LEVEL1_CONTROLLERS {
        attach_host(&mut graph, entry, &mut next_link_id)?;
    }
    expect_node_count(&graph, 1 + LEVEL1_CONTROLLERS.len(), "controller phase")?;

    for entry in LEVEL1_STATIONS {
        attach_host(&mut graph, entry, &mut next_link_id)?;
    }

    if include_adversary {
        attach_host(&mut graph, &LEVEL1_ADVERSARY, &mut next_link_id)?;
        expect_node_count(
            &graph,
            2 + LEVEL1_CONTROLLERS.len() + LEVEL1_STATIONS.len(),
            "adversary phase",
        )?;
    }

    Ok(graph)
}

fn attach_host(
    graph: &mut TopologyGraph,
    entry: &HostEntry,
    next_link_id: &mut u32,
) -> Result<(), TopologyError> {
    let device = DeviceSpec::host(entry.id, entry.role, entry.address, NETMASK, entry.mac)?;
    graph.add_device(&device)?;

    let link = LinkSpec::new(next_link_id.to_string(), LINK_BANDWIDTH_MBPS, 0.0, 0.0)?;
    graph.add_link(entry.id, HUB, &link)?;
    *next_link_id += 1;
    Ok(())
}

/// A mismatch means the static address table disagrees with the blueprint's
/// expected device set. Fatal: the launch must abort before any emulation
/// resource is allocated.
fn expect_node_count(
    graph: &TopologyGraph,
    expected: usize,
    phase: &str,
) -> Result<(), TopologyError> {
    if graph.node_count() != expected {
        return Err(TopologyError::InvariantViolation(format!(
            "{phase}: expected {expected} nodes, found {}",
            graph.node_count()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceRole;

    #[test]
    fn level1_is_a_hub_star() {
        let graph = level1(false).unwrap();

        assert_eq!(graph.node_count(), 10);
        assert_eq!(graph.edge_count(), 9);
        for node in graph.nodes() {
            if node.id == HUB {
                assert_eq!(graph.degree(&node.id), graph.node_count() - 1);
            } else {
                assert_eq!(graph.degree(&node.id), 1);
                assert!(graph.contains_edge(&node.id, HUB));
            }
        }
    }

    #[test]
    fn adversary_adds_exactly_one_node_and_edge() {
        let base = level1(false).unwrap();
        let with_adversary = level1(true).unwrap();

        assert_eq!(with_adversary.node_count(), base.node_count() + 1);
        assert_eq!(with_adversary.edge_count(), base.edge_count() + 1);

        // The base graph is a strict prefix of the extended one
        for node in base.nodes() {
            assert_eq!(with_adversary.node(&node.id), Some(node));
        }
        for edge in base.edges() {
            assert!(with_adversary.contains_edge(&edge.source, &edge.target));
        }

        let attacker = with_adversary.node("attacker").unwrap();
        assert_eq!(attacker.role(), Some(DeviceRole::Adversary));
        assert!(with_adversary.contains_edge("attacker", HUB));
        assert!(!base.contains_node("attacker"));
    }

    #[test]
    fn construction_is_deterministic() {
        let first = build("level1", true).unwrap();
        let second = build("level1", true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn link_ids_are_monotonic() {
        let graph = level1(true).unwrap();
        let ids: Vec<_> = graph.edges().map(|e| e.attr("id").unwrap()).collect();
        let expected: Vec<String> = (0..graph.edge_count()).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn controllers_come_first_in_table_order() {
        let graph = level1(false).unwrap();
        let ids: Vec<_> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "s3", "plc1", "plc2", "plc3", "plc4", "plc5", "plc6", "hmi", "histn", "workstn"
            ]
        );
    }

    #[test]
    fn unknown_blueprint_is_rejected() {
        let result = build("level99", false);
        assert!(matches!(result, Err(TopologyError::UnknownBlueprint(name)) if name == "level99"));
    }

    #[test]
    fn node_count_mismatch_is_an_invariant_violation() {
        let mut graph = TopologyGraph::new("t");
        graph.add_device(&DeviceSpec::switch(HUB)).unwrap();
        let result = expect_node_count(&graph, 7, "controller phase");
        assert!(matches!(result, Err(TopologyError::InvariantViolation(_))));
    }
}
