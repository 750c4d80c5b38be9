//! Dry-run emulation backend

use crate::emulation::{EmulationBackend, LiveNetwork, NodeHandle, SdnController};
use anyhow::bail;
use testbed_topology::graph::TopologyGraph;
use tracing::{debug, info};

/// Backend that logs every action instead of touching the host system. Lets
/// the full launch sequence run without root or kernel support.
pub struct NullBackend;

impl EmulationBackend for NullBackend {
    fn realize(
        &self,
        graph: &TopologyGraph,
        controller: &SdnController,
    ) -> anyhow::Result<Box<dyn LiveNetwork>> {
        debug!(name = graph.name(), "realizing dry-run emulation");
        Ok(Box::new(NullNetwork {
            controller: controller.clone(),
            node_ids: graph.nodes().map(|n| n.id.clone()).collect(),
            links: graph.edge_count(),
        }))
    }
}

struct NullNetwork {
    controller: SdnController,
    node_ids: Vec<String>,
    links: usize,
}

impl LiveNetwork for NullNetwork {
    fn start(&mut self) -> anyhow::Result<()> {
        info!("dry-run: start");
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        info!("dry-run: stop");
        Ok(())
    }

    fn node(&self, id: &str) -> anyhow::Result<Box<dyn NodeHandle>> {
        if !self.node_ids.iter().any(|n| n == id) {
            bail!("no emulated node named `{id}`");
        }
        Ok(Box::new(NullNode { id: id.to_string() }))
    }

    fn node_ids(&self) -> Vec<String> {
        self.node_ids.clone()
    }

    fn describe(&self) -> String {
        format!(
            "dry-run emulation: {} nodes, {} links (controller `{}` on port {})",
            self.node_ids.len(),
            self.links,
            self.controller.name,
            self.controller.listen_port
        )
    }
}

struct NullNode {
    id: String,
}

impl NodeHandle for NullNode {
    fn run(&self, command: &str) -> anyhow::Result<String> {
        info!(node = %self.id, command, "dry-run: exec");
        Ok(String::new())
    }

    fn spawn_background(&self, command: &str) -> anyhow::Result<u32> {
        info!(node = %self.id, command, "dry-run: spawn");
        Ok(0)
    }
}
