use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct CliOpt {
    /// Name of the topology blueprint to build
    #[arg(long, default_value = "level1")]
    pub topology: String,

    /// Include the adversarial node in the topology
    #[arg(long)]
    pub attacker: bool,

    /// Load the topology from a persisted document instead of building it
    /// (node ids are preserved verbatim)
    #[arg(long)]
    pub from_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the network emulation and run a launch profile against it
    Launch(LaunchOpt),
    /// Persist the topology as a JSON exchange document
    Export(ExportOpt),
    /// Render the topology as a Graphviz DOT document
    Render(RenderOpt),
    /// Print a summary of the topology's nodes and links
    Show,
}

#[derive(Parser, Debug, Clone)]
pub struct LaunchOpt {
    /// The launch profile applied to the live network
    #[arg(long, value_enum, default_value = "interactive")]
    pub profile: ProfileOpt,

    /// The emulation backend
    #[arg(long, value_enum, default_value = "netns")]
    pub backend: BackendOpt,

    /// Persist the topology before starting the emulation
    #[arg(long)]
    pub write_graph: bool,

    /// Pretty-print the persisted topology document
    #[arg(long)]
    pub pretty: bool,

    /// Render the topology to a DOT file before starting the emulation
    #[arg(long)]
    pub render: bool,

    /// Directory for persisted and rendered artifacts
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Command that seeds the shared state store (tutorial profile only)
    #[arg(long, default_value = "./state_db_init")]
    pub seed_command: String,

    /// Command template for the per-controller control programs (`{id}` is
    /// replaced with the device id)
    #[arg(long, default_value = "./programs/{id}")]
    pub program_template: String,

    /// Listen port of the external SDN controller
    #[arg(long, default_value_t = 6634)]
    pub controller_port: u16,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProfileOpt {
    Interactive,
    Workshop,
    Tutorial,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackendOpt {
    /// Linux network namespaces (requires root)
    Netns,
    /// Log every action without touching the host system
    DryRun,
}

#[derive(Parser, Debug, Clone)]
pub struct ExportOpt {
    /// Destination path of the exchange document
    #[arg(long)]
    pub out: PathBuf,

    /// Pretty-print the document
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RenderOpt {
    /// Destination path of the DOT document
    #[arg(long)]
    pub out: PathBuf,
}
