mod cli;
mod console;
mod emulation;
mod launch;
mod report;
mod state;

use crate::cli::{BackendOpt, CliOpt, Command, LaunchOpt, ProfileOpt};
use crate::console::StdConsole;
use crate::emulation::netns::NetnsBackend;
use crate::emulation::null::NullBackend;
use crate::emulation::{EmulationBackend, SdnController};
use crate::launch::{LaunchOptions, LaunchProfile, Launcher, TemplatePrograms};
use crate::state::{CommandStateStore, NoopStateStore, StateStore};
use anyhow::Context;
use clap::Parser;
use testbed_topology::graph::TopologyGraph;
use testbed_topology::{blueprint, json, render};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = CliOpt::parse();
    let graph = load_topology(&options)?;

    match &options.command {
        Command::Show => report::print_topology(&graph),
        Command::Export(export) => {
            json::write_graph(&graph, &export.out, export.pretty)?;
            println!("* Topology written to {}", export.out.display());
        }
        Command::Render(render_opt) => {
            render::render_dot(&graph, &render_opt.out)?;
            println!("* Topology rendered to {}", render_opt.out.display());
        }
        Command::Launch(launch_opt) => run_launch(&graph, launch_opt)?,
    }

    Ok(())
}

fn load_topology(options: &CliOpt) -> anyhow::Result<TopologyGraph> {
    match &options.from_file {
        // The orchestrator looks devices up by id, so ids are preserved
        // verbatim (no relabeling)
        Some(path) => json::read_graph(path, false)
            .with_context(|| format!("failed to load topology from {}", path.display())),
        None => blueprint::build(&options.topology, options.attacker)
            .context("failed to build topology"),
    }
}

fn run_launch(graph: &TopologyGraph, options: &LaunchOpt) -> anyhow::Result<()> {
    let backend: Box<dyn EmulationBackend> = match options.backend {
        BackendOpt::Netns => Box::new(NetnsBackend::new("tb")),
        BackendOpt::DryRun => Box::new(NullBackend),
    };
    let store: Box<dyn StateStore> = match options.profile {
        ProfileOpt::Tutorial => Box::new(CommandStateStore::new(options.seed_command.clone())),
        _ => Box::new(NoopStateStore),
    };
    let programs = TemplatePrograms::new(options.program_template.clone());
    let console = StdConsole;

    let launcher = Launcher {
        backend: &*backend,
        store: &*store,
        console: &console,
        programs: &programs,
        controller: SdnController::new("pox", options.controller_port),
    };

    let profile = match options.profile {
        ProfileOpt::Interactive => LaunchProfile::Interactive,
        ProfileOpt::Workshop => LaunchProfile::Workshop,
        ProfileOpt::Tutorial => LaunchProfile::Tutorial,
    };

    println!("--- Launch ---");
    println!(
        "* Topology: {} ({} nodes, {} edges)",
        graph.name(),
        graph.node_count(),
        graph.edge_count()
    );
    println!("* Profile: {profile:?}");

    launcher.launch(
        graph,
        profile,
        &LaunchOptions {
            persist: options.write_graph,
            render: options.render,
            pretty: options.pretty,
            out_dir: options.out_dir.clone(),
        },
    )
}
