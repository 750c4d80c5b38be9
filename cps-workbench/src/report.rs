//! Plain-text topology summaries

use testbed_topology::graph::TopologyGraph;

pub fn print_topology(graph: &TopologyGraph) {
    println!("--- Topology `{}` ---", graph.name());
    println!(
        "* {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    println!("--- Nodes ---");
    for node in graph.nodes() {
        let role = node.attr("role").unwrap_or("?");
        match node.attr("address") {
            Some(address) => println!(
                "* {} ({role}): {address} netmask {} mac {}",
                node.id,
                node.attr("netmask").unwrap_or("?"),
                node.attr("mac").unwrap_or("?"),
            ),
            None => println!("* {} ({role})", node.id),
        }
    }

    println!("--- Links ---");
    for edge in graph.edges() {
        println!(
            "* {} <-> {}: {} Mbps, {} ms delay, {}% loss",
            edge.source,
            edge.target,
            edge.attr("bandwidth").unwrap_or("?"),
            edge.attr("delay").unwrap_or("?"),
            edge.attr("loss").unwrap_or("?"),
        );
    }
}
