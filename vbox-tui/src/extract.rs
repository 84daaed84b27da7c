//! Record extraction from VBoxManage output
//!
//! VBoxManage prints human-oriented `Label:   value` text. The parsers in this module
//! are plain functions over that text so they can be tested without VirtualBox; the
//! async wrappers fetch the text through a [`Gateway`] first.
//!
//! Extraction is lenient on purpose: unknown lines are ignored, labels that never
//! show up are simply absent, and a USB device block cut off before its
//! `Current State` line is dropped. Only the VM power state is strict, since acting
//! on a guessed state is worse than failing the listing.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::gateway::{self, Gateway};

static VM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"(.+)"(?:\s+\{[^}]*\})?\s*$"#).expect("VM line pattern is valid")
});

static STATE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^State:\s*(.+?)\s*\(").expect("state pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmSummary {
    pub name: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsbDeviceRecord {
    pub uuid: String,
    pub vendor_id: String,
    pub product_id: String,
    pub product: String,
    /// Not printed by every VBoxManage version.
    pub manufacturer: Option<String>,
    pub current_state: String,
    /// Whether this device shows up in the VM's own attached-device list.
    pub attached: bool,
}

/// Labels shown on the property screen, in display order.
pub const PROPERTY_LABELS: &[&str] = &[
    "Name",
    "Guest OS",
    "UUID",
    "Config file",
    "Memory size",
    "VRAM size",
    "Number of CPUs",
    "CPU exec cap",
    "Page Fusion",
    "HPET",
    "Chipset",
    "Firmware",
    "ACPI",
    "IOAPIC",
    "Time offset",
    "Hardw. virt.ext",
    "Nested Paging",
    "State",
    "Monitor count",
    "3D Acceleration",
    "Clipboard Mode",
    "VRDE",
    "USB",
];

/// A property that can be changed through `modifyvm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableProperty {
    pub label: &'static str,
    pub flag: &'static str,
    /// Unit suffix VBoxManage appends when printing the value.
    pub unit: Option<&'static str>,
}

impl EditableProperty {
    /// The editable part of a displayed value (`2048MB` -> `2048`).
    pub fn strip_unit<'a>(&self, value: &'a str) -> &'a str {
        match self.unit {
            Some(unit) => value.strip_suffix(unit).unwrap_or(value).trim(),
            None => value.trim(),
        }
    }

    /// How the value reads after a successful edit.
    pub fn display_value(&self, input: &str) -> String {
        format!("{}{}", input, self.unit.unwrap_or(""))
    }
}

pub const EDITABLE_PROPERTIES: &[EditableProperty] = &[
    EditableProperty {
        label: "Memory size",
        flag: "--memory",
        unit: Some("MB"),
    },
    EditableProperty {
        label: "VRAM size",
        flag: "--vram",
        unit: Some("MB"),
    },
    EditableProperty {
        label: "Number of CPUs",
        flag: "--cpus",
        unit: None,
    },
    EditableProperty {
        label: "CPU exec cap",
        flag: "--cpuexecutioncap",
        unit: Some("%"),
    },
    EditableProperty {
        label: "Monitor count",
        flag: "--monitorcount",
        unit: None,
    },
];

pub fn editable_property(label: &str) -> Option<&'static EditableProperty> {
    EDITABLE_PROPERTIES.iter().find(|p| p.label == label)
}

/// Value of a `Label:   value` line, if the line carries `label`.
///
/// The label must be followed directly by the colon, so `Product` does not match a
/// `ProductId:` line.
pub fn labeled_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix(label)?.strip_prefix(':').map(str::trim)
}

// === Field schema ===

/// Ordered field labels of a multi-line record. The last label is the terminal
/// field: seeing it seals the record in progress.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    fields: &'static [&'static str],
}

impl FieldSchema {
    pub const fn new(fields: &'static [&'static str]) -> Self {
        Self { fields }
    }

    pub fn terminal(&self) -> Option<&'static str> {
        self.fields.last().copied()
    }

    fn match_line<'a>(&self, line: &'a str) -> Option<(&'static str, &'a str)> {
        self.fields
            .iter()
            .find_map(|label| labeled_value(line, label).map(|value| (*label, value)))
    }
}

/// Field values of one record, keyed by schema label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRecord {
    values: HashMap<&'static str, String>,
}

impl FieldRecord {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.values.get(label).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Line-by-line state machine that groups `Label: value` lines into records.
///
/// Record boundaries are not marked in the text, so a record ends when its
/// terminal field is seen. Optional fields can be missing without shifting the
/// following records.
pub struct RecordScanner {
    schema: FieldSchema,
    current: FieldRecord,
    sealed: Vec<FieldRecord>,
}

impl RecordScanner {
    pub fn new(schema: FieldSchema) -> Self {
        Self {
            schema,
            current: FieldRecord::default(),
            sealed: Vec::new(),
        }
    }

    /// Feed one line. Returns true when the line sealed a record.
    pub fn feed(&mut self, line: &str) -> bool {
        let Some((label, value)) = self.schema.match_line(line) else {
            return false;
        };
        self.current.values.insert(label, value.to_string());
        if Some(label) == self.schema.terminal() {
            self.seal();
            true
        } else {
            false
        }
    }

    /// Close the record in progress and start a blank one.
    pub fn seal(&mut self) {
        let record = std::mem::take(&mut self.current);
        self.sealed.push(record);
    }

    /// Sealed records in input order. A record still in progress is discarded.
    pub fn finish(self) -> Vec<FieldRecord> {
        if !self.current.is_empty() {
            debug!(fields = self.current.values.len(), "Dropping truncated record");
        }
        self.sealed
    }
}

pub const USB_HOST_SCHEMA: FieldSchema = FieldSchema::new(&[
    "UUID",
    "VendorId",
    "ProductId",
    "Manufacturer",
    "Product",
    "Current State",
]);

// === Parsers ===

/// VM names from `list vms`, in listing order.
pub fn parse_vm_names(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| VM_LINE.captures(line.trim_end()))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Power state from `showvminfo` (`State: running (since ...)` -> `running`).
pub fn parse_vm_state(info: &str) -> Option<String> {
    let line = info.lines().find(|line| line.starts_with("State:"))?;
    STATE_VALUE
        .captures(line)
        .map(|caps| caps[1].to_string())
}

/// Properties for each of `labels` found in `info`, in label order.
pub fn parse_properties(info: &str, labels: &[&str]) -> Vec<PropertyEntry> {
    let mut found: HashMap<&str, &str> = HashMap::new();
    for line in info.lines() {
        if let Some((label, value)) = labels
            .iter()
            .find_map(|label| labeled_value(line, label).map(|v| (*label, v)))
        {
            found.entry(label).or_insert(value);
        }
    }

    labels
        .iter()
        .filter_map(|label| {
            found.get(label).map(|value| PropertyEntry {
                key: label.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

fn normalize_uuid(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .to_ascii_lowercase()
}

/// UUIDs of the devices attached to a VM, from its `showvminfo` output.
pub fn parse_attached_uuids(info: &str) -> HashSet<String> {
    info.lines()
        .filter_map(|line| labeled_value(line, "UUID"))
        .map(normalize_uuid)
        .collect()
}

impl UsbDeviceRecord {
    fn from_fields(fields: &FieldRecord, attached: &HashSet<String>) -> Self {
        let text = |label: &str| fields.get(label).unwrap_or_default().to_string();
        let uuid = text("UUID");
        Self {
            attached: attached.contains(&normalize_uuid(&uuid)),
            uuid,
            vendor_id: text("VendorId"),
            product_id: text("ProductId"),
            product: text("Product"),
            manufacturer: fields.get("Manufacturer").map(str::to_string),
            current_state: text("Current State"),
        }
    }
}

/// Scan `hosts` (`list usbhost`) with `schema` and mark the devices listed in
/// `info` (`showvminfo`) as attached.
pub fn parse_usb_devices_with(
    schema: FieldSchema,
    info: &str,
    hosts: &str,
) -> Vec<UsbDeviceRecord> {
    let attached = parse_attached_uuids(info);
    let mut scanner = RecordScanner::new(schema);
    for line in hosts.lines() {
        scanner.feed(line);
    }
    scanner
        .finish()
        .iter()
        .map(|fields| UsbDeviceRecord::from_fields(fields, &attached))
        .collect()
}

pub fn parse_usb_devices(info: &str, hosts: &str) -> Vec<UsbDeviceRecord> {
    parse_usb_devices_with(USB_HOST_SCHEMA, info, hosts)
}

// === Fetchers ===

/// All registered VMs with their power state.
///
/// Costs one `showvminfo` call per VM on top of `list vms`.
pub async fn list_vms(gateway: &dyn Gateway) -> Result<Vec<VmSummary>> {
    let listing = gateway.run(&gateway::list_vms()).await?;

    let mut vms = Vec::new();
    for name in parse_vm_names(&listing) {
        let command = gateway::show_vm_info(&name);
        let info = gateway.run(&command).await?;
        let state = parse_vm_state(&info).ok_or(Error::ExtractionMismatch {
            what: "VM state",
            command,
        })?;
        vms.push(VmSummary { name, state });
    }

    debug!(count = vms.len(), "Listed VMs");
    Ok(vms)
}

pub async fn vm_properties(gateway: &dyn Gateway, vm: &str) -> Result<Vec<PropertyEntry>> {
    let info = gateway.run(&gateway::show_vm_info(vm)).await?;
    Ok(parse_properties(&info, PROPERTY_LABELS))
}

pub async fn usb_devices(gateway: &dyn Gateway, vm: &str) -> Result<Vec<UsbDeviceRecord>> {
    let info = gateway.run(&gateway::show_vm_info(vm)).await?;
    let hosts = gateway.run(&gateway::list_usb_hosts()).await?;
    let devices = parse_usb_devices(&info, &hosts);
    debug!(vm = %vm, count = devices.len(), "Listed USB devices");
    Ok(devices)
}
