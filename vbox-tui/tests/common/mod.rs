//! Test helpers for vbox-tui integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vbox_tui::error::{Error, Result};
use vbox_tui::gateway::{self, Gateway};

pub const LIST_VMS: &str = r#""web" {0b7c5a8e-1111-4c3a-9a7e-3c1e2f6d0001}
"db" {0b7c5a8e-2222-4c3a-9a7e-3c1e2f6d0002}
"#;

pub const WEB_INFO: &str = "Name:                        web
Guest OS:                    Ubuntu (64-bit)
UUID:                        0b7c5a8e-1111-4c3a-9a7e-3c1e2f6d0001
Memory size:                 2048MB
VRAM size:                   16MB
Number of CPUs:              2
State:                       running (since 2024-05-01T10:00:00.000000000)
Currently Attached USB Devices:

UUID:               8e3c1f2a-aaaa-4b5c-9d0e-000000000001
VendorId:           0x046d (046D)
";

pub const DB_INFO: &str = "Name:                        db
Guest OS:                    Debian (64-bit)
UUID:                        0b7c5a8e-2222-4c3a-9a7e-3c1e2f6d0002
Memory size:                 4096MB
Number of CPUs:              4
State:                       powered off (since 2024-04-30T08:00:00.000000000)
";

pub const USB_HOSTS: &str = "Host USB Devices:

UUID:               8e3c1f2a-aaaa-4b5c-9d0e-000000000001
VendorId:           0x046d (046D)
ProductId:          0xc52b (C52B)
Manufacturer:       Logitech
Product:            USB Receiver
Current State:      Captured

UUID:               8e3c1f2a-bbbb-4b5c-9d0e-000000000002
VendorId:           0x0781 (0781)
ProductId:          0x5581 (5581)
Product:            Ultra
Current State:      Busy
";

pub const RECEIVER_UUID: &str = "8e3c1f2a-aaaa-4b5c-9d0e-000000000001";
pub const STICK_UUID: &str = "8e3c1f2a-bbbb-4b5c-9d0e-000000000002";

/// `showvminfo web` output once the stick is attached as well.
pub fn web_info_with_stick() -> String {
    format!(
        "{}\nUUID:               {}\nVendorId:           0x0781 (0781)\n",
        WEB_INFO, STICK_UUID
    )
}

type Response = std::result::Result<String, (Option<i32>, String)>;

/// Gateway answering from a table of canned outputs and recording every call.
///
/// Commands without an entry succeed with empty output. Clones share state, so a
/// test can keep a handle after boxing one into an `App`.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    responses: Arc<Mutex<HashMap<String, Response>>>,
    effects: Arc<Mutex<HashMap<String, Vec<(String, String)>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two VMs (`web` running, `db` powered off) and two host USB devices, the
    /// first attached to `web`.
    pub fn with_fixture() -> Self {
        let gw = Self::new();
        gw.respond(&gateway::list_vms(), LIST_VMS);
        gw.respond(&gateway::show_vm_info("web"), WEB_INFO);
        gw.respond(&gateway::show_vm_info("db"), DB_INFO);
        gw.respond(&gateway::list_usb_hosts(), USB_HOSTS);
        gw
    }

    pub fn respond(&self, command: &str, output: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(command.to_string(), Ok(output.to_string()));
    }

    pub fn fail(&self, command: &str, exit_code: i32, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(command.to_string(), Err((Some(exit_code), message.to_string())));
    }

    /// Once `trigger` succeeds, answer `command` with `output` from then on.
    pub fn on_success(&self, trigger: &str, command: &str, output: &str) {
        self.effects
            .lock()
            .unwrap()
            .entry(trigger.to_string())
            .or_default()
            .push((command.to_string(), output.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == command).count()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn run(&self, command: &str) -> Result<String> {
        self.calls.lock().unwrap().push(command.to_string());
        let response = self.responses.lock().unwrap().get(command).cloned();
        match response {
            Some(Err((code, message))) => Err(Error::gateway(code, message)),
            response => {
                let effects = self.effects.lock().unwrap().get(command).cloned();
                for (next, output) in effects.unwrap_or_default() {
                    self.respond(&next, &output);
                }
                Ok(response.and_then(|r| r.ok()).unwrap_or_default())
            }
        }
    }
}
