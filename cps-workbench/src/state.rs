//! Shared state store boundary
//!
//! The device programs coordinate through a persistent state store. The
//! workbench treats it as an opaque external resource: it seeds it exactly
//! once, before any device process starts, and never touches it again.

use anyhow::{Context, bail};
use std::process::Command;
use tracing::info;

pub trait StateStore {
    /// Blocking one-shot initialization. Must complete before any device
    /// process starts.
    fn seed(&self) -> anyhow::Result<()>;
}

/// Seeds the store by running an external command to completion.
pub struct CommandStateStore {
    command: String,
}

impl CommandStateStore {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl StateStore for CommandStateStore {
    fn seed(&self) -> anyhow::Result<()> {
        info!(command = %self.command, "seeding state store");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .with_context(|| format!("failed to run state seeding command `{}`", self.command))?;
        if !status.success() {
            bail!(
                "state seeding command `{}` exited with {status}",
                self.command
            );
        }
        Ok(())
    }
}

/// No store to seed.
pub struct NoopStateStore;

impl StateStore for NoopStateStore {
    fn seed(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
