//! Boundary to the external network emulation engine
//!
//! The workbench only instantiates devices and links. Everything below that
//! (packet forwarding, the SDN controller's forwarding logic, the device
//! programs themselves) belongs to the engine behind these traits.

pub mod netns;
pub mod null;

use testbed_topology::graph::TopologyGraph;

/// Reference to the designated external SDN controller. The emulation engine
/// attaches it to its control channel; what the controller does with the
/// switches is a black box.
#[derive(Clone, Debug)]
pub struct SdnController {
    pub name: String,
    pub listen_port: u16,
}

impl SdnController {
    pub fn new(name: impl Into<String>, listen_port: u16) -> Self {
        Self {
            name: name.into(),
            listen_port,
        }
    }
}

pub trait EmulationBackend {
    /// Translates the topology into an emulation ready to be started: one
    /// emulated node per device, one shaped link per edge.
    fn realize(
        &self,
        graph: &TopologyGraph,
        controller: &SdnController,
    ) -> anyhow::Result<Box<dyn LiveNetwork>>;
}

pub trait LiveNetwork {
    fn start(&mut self) -> anyhow::Result<()>;

    /// Releases all emulation resources. Called exactly once per launch;
    /// namespace setup is not idempotent, so failures are not retried.
    fn stop(&mut self) -> anyhow::Result<()>;

    /// Handle for running commands inside the device's namespace.
    fn node(&self, id: &str) -> anyhow::Result<Box<dyn NodeHandle>>;

    /// Device ids known to the emulation, in topology order.
    fn node_ids(&self) -> Vec<String>;

    /// One-line description for the console banner and logs.
    fn describe(&self) -> String;
}

pub trait NodeHandle {
    /// Runs a command to completion and returns its standard output.
    fn run(&self, command: &str) -> anyhow::Result<String>;

    /// Spawns a command in the background and returns its pid. The process is
    /// never joined; it lives until the owning namespace is torn down.
    fn spawn_background(&self, command: &str) -> anyhow::Result<u32>;
}
