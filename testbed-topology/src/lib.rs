//! Topology construction layer for a cyber-physical testbed
//!
//! Builds a validated device/link graph from a named blueprint, round-trips it
//! through a JSON exchange document and renders it to Graphviz DOT. Everything
//! below device/link instantiation (packet forwarding, the per-device control
//! programs, the SDN controller) lives behind the launch layer's emulation
//! boundary and is not part of this crate.

pub mod blueprint;
pub mod device;
pub mod graph;
pub mod json;
pub mod link;
pub mod render;

use std::collections::BTreeMap;
use thiserror::Error;

/// Attribute mapping attached to a graph node or edge.
///
/// Values are kept as strings: the exchange format stores them as text, and
/// consumers that need numeric semantics reparse them explicitly.
pub type Attrs = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("invalid address for device `{device}`: {reason}")]
    InvalidAddress { device: String, reason: String },
    #[error("invalid parameters for link `{link}`: {reason}")]
    InvalidLinkParams { link: String, reason: String },
    #[error("unknown blueprint `{0}`")]
    UnknownBlueprint(String),
    #[error("topology invariant violated: {0}")]
    InvariantViolation(String),
    #[error("device `{0}` is already present in the topology")]
    DuplicateDevice(String),
    #[error("link references unknown device `{0}`")]
    UnknownDevice(String),
    #[error("failed to access topology document: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed topology document: {0}")]
    Format(#[from] serde_json::Error),
}
