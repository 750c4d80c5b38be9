//! Launch orchestration
//!
//! Drives one synchronous launch: optional persist/render of the topology,
//! realize the emulation, run the selected profile against the live network,
//! tear the emulation down.

use crate::console::Console;
use crate::emulation::{EmulationBackend, LiveNetwork, SdnController};
use crate::state::StateStore;
use anyhow::Context;
use std::path::PathBuf;
use testbed_topology::device::DeviceRole;
use testbed_topology::graph::TopologyGraph;
use testbed_topology::{json, render};
use tracing::{info, warn};

/// Closed set of launch strategies, chosen once per launch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LaunchProfile {
    /// Start the emulation and hand control to the console; no device logic
    /// runs.
    Interactive,
    /// Reserved placeholder; performs no device bring-up at all.
    Workshop,
    /// Seed the state store, start the emulation, spawn one control program
    /// per controller, then hand control to the console.
    Tutorial,
}

/// Maps a controller device to its control-logic command.
pub trait ControlPrograms {
    fn command_for(&self, device_id: &str) -> String;
}

/// Substitutes the device id into a command template (`{id}` placeholder).
pub struct TemplatePrograms {
    template: String,
}

impl TemplatePrograms {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl ControlPrograms for TemplatePrograms {
    fn command_for(&self, device_id: &str) -> String {
        self.template.replace("{id}", device_id)
    }
}

pub struct LaunchOptions {
    /// Persist the topology document before starting the emulation.
    pub persist: bool,
    /// Render the DOT document before starting the emulation.
    pub render: bool,
    pub pretty: bool,
    pub out_dir: PathBuf,
}

pub struct Launcher<'a> {
    pub backend: &'a dyn EmulationBackend,
    pub store: &'a dyn StateStore,
    pub console: &'a dyn Console,
    pub programs: &'a dyn ControlPrograms,
    pub controller: SdnController,
}

impl Launcher<'_> {
    pub fn launch(
        &self,
        graph: &TopologyGraph,
        profile: LaunchProfile,
        options: &LaunchOptions,
    ) -> anyhow::Result<()> {
        // Persist/render are independent of whether the emulation starts
        if options.persist {
            let path = options.out_dir.join(format!("{}.json", graph.name()));
            json::write_graph(graph, &path, options.pretty)
                .with_context(|| format!("failed to persist topology to {}", path.display()))?;
            info!(path = %path.display(), "topology persisted");
        }
        if options.render {
            let path = options.out_dir.join(format!("{}.dot", graph.name()));
            render::render_dot(graph, &path)
                .with_context(|| format!("failed to render topology to {}", path.display()))?;
            info!(path = %path.display(), "topology rendered");
        }

        let mut net = self
            .backend
            .realize(graph, &self.controller)
            .context("failed to realize the network emulation")?;

        match profile {
            LaunchProfile::Workshop => {
                info!("workshop profile: no device bring-up");
                Ok(())
            }
            LaunchProfile::Interactive => self.run_with_console(net.as_mut(), |_| {}),
            LaunchProfile::Tutorial => {
                // The device programs read the store on startup, so seeding
                // must complete before anything is spawned
                self.store.seed().context("state store seeding failed")?;
                self.run_with_console(net.as_mut(), |live| {
                    self.spawn_control_programs(graph, live)
                })
            }
        }
    }

    /// Starts the emulation, runs `bring_up` and the console, and stops the
    /// emulation exactly once on every exit path past a successful start.
    /// Console errors are escalated after teardown.
    fn run_with_console(
        &self,
        net: &mut dyn LiveNetwork,
        bring_up: impl FnOnce(&dyn LiveNetwork),
    ) -> anyhow::Result<()> {
        net.start().context("failed to start the network emulation")?;
        bring_up(&*net);
        let session = self.console.attach(&*net);
        let teardown = net.stop();
        session?;
        teardown.context("failed to stop the network emulation")
    }

    /// One background process per controller, in topology order. Spawns are
    /// fire-and-forget: the pid is captured and logged, never joined, and a
    /// failed spawn does not abort the launch.
    fn spawn_control_programs(&self, graph: &TopologyGraph, net: &dyn LiveNetwork) {
        for node in graph.nodes() {
            if node.role() != Some(DeviceRole::Controller) {
                continue;
            }
            let command = self.programs.command_for(&node.id);
            match net
                .node(&node.id)
                .and_then(|handle| handle.spawn_background(&command))
            {
                Ok(pid) => info!(device = %node.id, pid, %command, "control program spawned"),
                Err(error) => {
                    warn!(device = %node.id, %command, "failed to spawn control program: {error:#}")
                }
            }
        }
    }
}
