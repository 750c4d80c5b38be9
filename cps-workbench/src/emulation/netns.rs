//! Linux network-namespace emulation backend
//!
//! Instantiates the topology with one namespace per non-switch device, one
//! bridge per switch and one veth pair per link, shaped with `tc netem`.
//! Packet forwarding is the kernel's job; this module only drives `ip` and
//! `tc`. Hosts must be single-homed (one link, to a switch), which holds for
//! all hub-star blueprints. Requires root.

use crate::emulation::{EmulationBackend, LiveNetwork, NodeHandle, SdnController};
use anyhow::{Context, bail};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use testbed_topology::device::DeviceRole;
use testbed_topology::graph::{EdgeEntry, TopologyGraph};
use tracing::{debug, info};

pub struct NetnsBackend {
    /// Prefix for namespace, bridge and interface names, so several testbeds
    /// can coexist on one machine.
    prefix: String,
}

impl NetnsBackend {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

struct HostPlan {
    id: String,
    namespace: String,
}

struct BridgePlan {
    bridge: String,
}

struct LinkPlan {
    host_namespace: String,
    host_ifname: String,
    host_mac: String,
    /// Address in CIDR notation, ready for `ip addr add`.
    host_cidr: String,
    bridge: String,
    bridge_ifname: String,
    netem: Vec<String>,
}

impl EmulationBackend for NetnsBackend {
    fn realize(
        &self,
        graph: &TopologyGraph,
        controller: &SdnController,
    ) -> anyhow::Result<Box<dyn LiveNetwork>> {
        let mut node_ids = Vec::new();
        let mut hosts = Vec::new();
        let mut bridges = HashMap::new();
        for node in graph.nodes() {
            let role = node
                .role()
                .with_context(|| format!("device `{}` has no usable role attribute", node.id))?;
            node_ids.push(node.id.clone());
            if role == DeviceRole::Switch {
                bridges.insert(
                    node.id.clone(),
                    BridgePlan {
                        bridge: format!("{}-{}", self.prefix, node.id),
                    },
                );
            } else {
                hosts.push(HostPlan {
                    id: node.id.clone(),
                    namespace: format!("{}-{}", self.prefix, node.id),
                });
            }
        }

        let mut links = Vec::new();
        let mut attached: HashSet<String> = HashSet::new();
        for (index, edge) in graph.edges().enumerate() {
            let (host_id, switch_id) =
                match (bridges.contains_key(&edge.source), bridges.contains_key(&edge.target)) {
                    (false, true) => (&edge.source, &edge.target),
                    (true, false) => (&edge.target, &edge.source),
                    (true, true) => bail!(
                        "link `{}`-`{}` connects two switches, which the netns backend does not support",
                        edge.source,
                        edge.target
                    ),
                    (false, false) => bail!(
                        "link `{}`-`{}` connects two hosts, which the netns backend does not support",
                        edge.source,
                        edge.target
                    ),
                };
            if !attached.insert(host_id.clone()) {
                bail!("host `{host_id}` has more than one link; the netns backend only supports single-homed hosts");
            }

            let node = graph
                .node(host_id)
                .with_context(|| format!("link endpoint `{host_id}` not found"))?;
            let address: Ipv4Addr = required_attr(node.attr("address"), host_id, "address")?
                .parse()
                .with_context(|| format!("device `{host_id}` has a malformed address"))?;
            let netmask: Ipv4Addr = required_attr(node.attr("netmask"), host_id, "netmask")?
                .parse()
                .with_context(|| format!("device `{host_id}` has a malformed netmask"))?;
            let prefix_len = ipnet::ipv4_mask_to_prefix(netmask)
                .with_context(|| format!("device `{host_id}` has a non-contiguous netmask"))?;
            let mac = required_attr(node.attr("mac"), host_id, "mac")?;

            links.push(LinkPlan {
                host_namespace: format!("{}-{}", self.prefix, host_id),
                host_ifname: format!("{}-l{index}h", self.prefix),
                host_mac: mac.to_string(),
                host_cidr: format!("{address}/{prefix_len}"),
                bridge: bridges[switch_id.as_str()].bridge.clone(),
                bridge_ifname: format!("{}-l{index}b", self.prefix),
                netem: shaping_args(edge)?,
            });
        }

        Ok(Box::new(NetnsNetwork {
            controller: controller.clone(),
            node_ids,
            hosts,
            bridges: bridges.into_values().collect(),
            links,
            children: Arc::new(Mutex::new(Vec::new())),
        }))
    }
}

fn required_attr<'a>(value: Option<&'a str>, device: &str, key: &str) -> anyhow::Result<&'a str> {
    value.with_context(|| format!("device `{device}` has no `{key}` attribute"))
}

/// Link attributes come back from the exchange format as text; the shaping
/// parameters are reparsed here.
fn shaping_args(edge: &EdgeEntry) -> anyhow::Result<Vec<String>> {
    let bandwidth = numeric_attr(edge, "bandwidth")?.unwrap_or(0.0);
    let delay = numeric_attr(edge, "delay")?.unwrap_or(0.0);
    let loss = numeric_attr(edge, "loss")?.unwrap_or(0.0);

    let mut args = Vec::new();
    if bandwidth > 0.0 {
        args.extend(["rate".to_string(), format!("{bandwidth}mbit")]);
    }
    if delay > 0.0 {
        args.extend(["delay".to_string(), format!("{delay}ms")]);
    }
    if loss > 0.0 {
        args.extend(["loss".to_string(), format!("{loss}%")]);
    }
    Ok(args)
}

fn numeric_attr(edge: &EdgeEntry, key: &str) -> anyhow::Result<Option<f64>> {
    edge.attr(key)
        .map(|value| {
            value
                .parse::<f64>()
                .with_context(|| format!("link attribute `{key}` is not numeric: `{value}`"))
        })
        .transpose()
}

struct NetnsNetwork {
    controller: SdnController,
    node_ids: Vec<String>,
    hosts: Vec<HostPlan>,
    bridges: Vec<BridgePlan>,
    links: Vec<LinkPlan>,
    children: Arc<Mutex<Vec<Child>>>,
}

impl LiveNetwork for NetnsNetwork {
    fn start(&mut self) -> anyhow::Result<()> {
        info!(
            controller = %self.controller.name,
            port = self.controller.listen_port,
            "starting netns emulation"
        );

        for bridge in &self.bridges {
            run(Command::new("ip").args(["link", "add", &bridge.bridge, "type", "bridge"]))?;
            run(Command::new("ip").args(["link", "set", &bridge.bridge, "up"]))?;
        }
        for host in &self.hosts {
            run(Command::new("ip").args(["netns", "add", &host.namespace]))?;
            run(Command::new("ip").args(["-n", &host.namespace, "link", "set", "lo", "up"]))?;
        }
        for link in &self.links {
            run(Command::new("ip").args([
                "link",
                "add",
                &link.host_ifname,
                "type",
                "veth",
                "peer",
                "name",
                &link.bridge_ifname,
            ]))?;
            run(Command::new("ip").args([
                "link",
                "set",
                &link.host_ifname,
                "netns",
                &link.host_namespace,
            ]))?;
            run(Command::new("ip").args(["link", "set", &link.bridge_ifname, "master", &link.bridge]))?;
            run(Command::new("ip").args(["link", "set", &link.bridge_ifname, "up"]))?;
            run(Command::new("ip").args([
                "-n",
                &link.host_namespace,
                "link",
                "set",
                &link.host_ifname,
                "address",
                &link.host_mac,
            ]))?;
            run(Command::new("ip").args([
                "-n",
                &link.host_namespace,
                "addr",
                "add",
                &link.host_cidr,
                "dev",
                &link.host_ifname,
            ]))?;
            run(Command::new("ip").args([
                "-n",
                &link.host_namespace,
                "link",
                "set",
                &link.host_ifname,
                "up",
            ]))?;

            if !link.netem.is_empty() {
                // Shape both directions of the veth pair
                let mut host_side = Command::new("ip");
                host_side.args([
                    "netns",
                    "exec",
                    &link.host_namespace,
                    "tc",
                    "qdisc",
                    "add",
                    "dev",
                    &link.host_ifname,
                    "root",
                    "netem",
                ]);
                host_side.args(&link.netem);
                run(&mut host_side)?;

                let mut bridge_side = Command::new("tc");
                bridge_side.args(["qdisc", "add", "dev", &link.bridge_ifname, "root", "netem"]);
                bridge_side.args(&link.netem);
                run(&mut bridge_side)?;
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        info!("stopping netns emulation");

        // Device processes die with their namespaces; reap them first so no
        // namespace stays pinned by a live process.
        for child in self.children.lock().iter_mut() {
            if let Err(error) = child.kill() {
                debug!(%error, "background process already gone");
            }
            let _ = child.wait();
        }

        let mut failures = Vec::new();
        for host in &self.hosts {
            if let Err(error) = run(Command::new("ip").args(["netns", "del", &host.namespace])) {
                failures.push(format!("{}: {error:#}", host.namespace));
            }
        }
        for bridge in &self.bridges {
            if let Err(error) = run(Command::new("ip").args(["link", "del", &bridge.bridge])) {
                failures.push(format!("{}: {error:#}", bridge.bridge));
            }
        }
        if !failures.is_empty() {
            bail!(
                "emulation teardown left resources behind: {}",
                failures.join("; ")
            );
        }
        Ok(())
    }

    fn node(&self, id: &str) -> anyhow::Result<Box<dyn NodeHandle>> {
        let host = self
            .hosts
            .iter()
            .find(|h| h.id == id)
            .with_context(|| format!("no emulated host named `{id}`"))?;
        Ok(Box::new(NetnsNode {
            namespace: host.namespace.clone(),
            children: self.children.clone(),
        }))
    }

    fn node_ids(&self) -> Vec<String> {
        self.node_ids.clone()
    }

    fn describe(&self) -> String {
        format!(
            "netns emulation: {} hosts, {} switches, {} links (controller `{}` on port {})",
            self.hosts.len(),
            self.bridges.len(),
            self.links.len(),
            self.controller.name,
            self.controller.listen_port
        )
    }
}

struct NetnsNode {
    namespace: String,
    children: Arc<Mutex<Vec<Child>>>,
}

impl NodeHandle for NetnsNode {
    fn run(&self, command: &str) -> anyhow::Result<String> {
        run(Command::new("ip").args(["netns", "exec", &self.namespace, "sh", "-c", command]))
    }

    fn spawn_background(&self, command: &str) -> anyhow::Result<u32> {
        debug!(namespace = %self.namespace, command, "spawning background process");
        let child = Command::new("ip")
            .args(["netns", "exec", &self.namespace, "sh", "-c", command])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| {
                format!("failed to spawn `{command}` in namespace {}", self.namespace)
            })?;
        let pid = child.id();
        self.children.lock().push(child);
        Ok(pid)
    }
}

fn run(command: &mut Command) -> anyhow::Result<String> {
    debug!(?command, "exec");
    let output = command
        .output()
        .with_context(|| format!("failed to execute {command:?}"))?;
    if !output.status.success() {
        bail!(
            "{command:?} failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use testbed_topology::blueprint;
    use testbed_topology::device::DeviceSpec;
    use testbed_topology::link::LinkSpec;

    fn controller() -> SdnController {
        SdnController::new("pox", 6634)
    }

    #[test]
    fn realize_plans_one_namespace_per_host() {
        let graph = blueprint::build("level1", true).unwrap();
        let net = NetnsBackend::new("tb").realize(&graph, &controller()).unwrap();

        assert_eq!(net.node_ids().len(), 11);
        assert!(net.describe().contains("10 hosts, 1 switches, 10 links"));
        assert!(net.node("plc1").is_ok());
        assert!(net.node("s3").is_err());
        assert!(net.node("nope").is_err());
    }

    #[test]
    fn host_to_host_links_are_rejected() {
        let mut graph = TopologyGraph::new("t");
        for (id, octet) in [("plc1", 10), ("plc2", 20)] {
            let device = DeviceSpec::host(
                id,
                DeviceRole::Controller,
                &format!("192.168.1.{octet}"),
                "255.255.255.0",
                &format!("00:1d:9c:c7:b0:{octet:02x}"),
            )
            .unwrap();
            graph.add_device(&device).unwrap();
        }
        let link = LinkSpec::new("0", 30.0, 0.0, 0.0).unwrap();
        graph.add_link("plc1", "plc2", &link).unwrap();

        let result = NetnsBackend::new("tb").realize(&graph, &controller());
        assert!(result.is_err());
    }

    #[test]
    fn shaping_skips_zero_valued_parameters() {
        let graph = blueprint::build("level1", false).unwrap();
        let edge = graph.edges().next().unwrap();
        // 30 Mbps, no delay, no loss
        assert_eq!(shaping_args(edge).unwrap(), ["rate", "30mbit"]);
    }

    #[test]
    fn non_numeric_shaping_attributes_are_reported() {
        let mut graph = TopologyGraph::new("t");
        graph.add_device(&DeviceSpec::switch("s3")).unwrap();
        let device = DeviceSpec::host(
            "plc1",
            DeviceRole::Controller,
            "192.168.1.10",
            "255.255.255.0",
            "00:1d:9c:c7:b0:01",
        )
        .unwrap();
        graph.add_device(&device).unwrap();
        let mut attrs = testbed_topology::Attrs::new();
        attrs.insert("bandwidth".to_string(), "fast".to_string());
        graph.add_edge("plc1", "s3", attrs).unwrap();

        let result = NetnsBackend::new("tb").realize(&graph, &controller());
        assert!(result.is_err());
    }
}
