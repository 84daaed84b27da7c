//! VBoxManage gateway
//!
//! Every interaction with VirtualBox goes through a single `run(command)` call that
//! takes a shell-style command line (without the program name) and returns the
//! captured stdout. Calls are never retried: VM state can change between two
//! invocations, so callers decide whether to re-issue a command.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const DEFAULT_PROGRAM: &str = "VBoxManage";

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Run `command` (split like a shell would) and return stdout.
    async fn run(&self, command: &str) -> Result<String>;
}

/// Gateway backed by the real `VBoxManage` executable
pub struct VBoxManage {
    program: PathBuf,
}

impl VBoxManage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for VBoxManage {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl Gateway for VBoxManage {
    async fn run(&self, command: &str) -> Result<String> {
        let args = shell_words::split(command)
            .map_err(|e| Error::gateway(None, format!("Cannot parse `{}`: {}", command, e)))?;

        debug!(program = %self.program.display(), command = %command, "Running VBoxManage");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                warn!(program = %self.program.display(), error = %e, "Failed to start VBoxManage");
                Error::gateway(
                    None,
                    format!("Failed to run {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            warn!(command = %command, code = ?output.status.code(), "VBoxManage failed");
            return Err(Error::gateway(output.status.code(), message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// === Command lines ===

pub fn list_vms() -> String {
    "list vms".to_string()
}

pub fn show_vm_info(vm: &str) -> String {
    format!("showvminfo {}", shell_words::quote(vm))
}

pub fn list_usb_hosts() -> String {
    "list usbhost".to_string()
}

pub fn usb_attach(vm: &str, uuid: &str) -> String {
    format!(
        "controlvm {} usbattach {}",
        shell_words::quote(vm),
        shell_words::quote(uuid)
    )
}

pub fn usb_detach(vm: &str, uuid: &str) -> String {
    format!(
        "controlvm {} usbdetach {}",
        shell_words::quote(vm),
        shell_words::quote(uuid)
    )
}

pub fn modify_vm(vm: &str, flag: &str, value: &str) -> String {
    format!(
        "modifyvm {} {} {}",
        shell_words::quote(vm),
        flag,
        shell_words::quote(value)
    )
}
