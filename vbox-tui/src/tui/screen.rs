//! Screen models
//!
//! A screen owns the rows it shows and the records behind them. `update` replaces
//! both in one go from fresh VBoxManage output; nothing is cached across updates.

use tracing::info;

use crate::error::{Error, Result};
use crate::extract::{self, PropertyEntry, UsbDeviceRecord, VmSummary, editable_property};
use crate::gateway::{self, Gateway};
use crate::tui::modals::property_edit::PropertyEditModal;
use crate::tui::types::{DisplayItem, ScreenId};

/// Key hint and its description, as shown in the header line.
pub type Shortcut = (&'static str, &'static str);

const VM_SHORTCUTS: &[Shortcut] = &[
    ("q", "Quit"),
    ("j/k", "Move"),
    ("\u{21b5}", "Properties"),
    ("u", "USB"),
    ("r", "Refresh"),
];

const PROPS_SHORTCUTS: &[Shortcut] = &[
    ("q", "Quit"),
    ("j/k", "Move"),
    ("e", "Edit"),
    ("h", "Back"),
    ("r", "Refresh"),
];

const USB_SHORTCUTS: &[Shortcut] = &[
    ("q", "Quit"),
    ("j/k", "Move"),
    ("Space", "Attach/Detach"),
    ("v", "Verbose"),
    ("h", "Back"),
    ("r", "Refresh"),
];

/// Records behind the rows of a screen.
#[derive(Debug, Clone, Default)]
enum ScreenContent {
    #[default]
    Empty,
    Vms(Vec<VmSummary>),
    Props {
        vm: String,
        entries: Vec<PropertyEntry>,
    },
    Usb {
        vm: String,
        devices: Vec<UsbDeviceRecord>,
    },
}

pub struct Screen {
    id: ScreenId,
    items: Vec<DisplayItem>,
    focus: Option<usize>,
    title: String,
    content: ScreenContent,
    verbose: bool,
    // Arguments of the last update; focus restarts at the top when they change
    args: Vec<String>,
}

impl Screen {
    pub fn new(id: ScreenId) -> Self {
        Self {
            id,
            items: Vec::new(),
            focus: None,
            title: String::new(),
            content: ScreenContent::Empty,
            verbose: false,
            args: Vec::new(),
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn shortcuts(&self) -> &'static [Shortcut] {
        match self.id {
            ScreenId::Nil => &[("q", "Quit")],
            ScreenId::Vm => VM_SHORTCUTS,
            ScreenId::Props => PROPS_SHORTCUTS,
            ScreenId::Usb => USB_SHORTCUTS,
        }
    }

    /// Rebuild the screen from `args` with fresh data.
    ///
    /// Focus stays on the same row when `args` match the previous update and
    /// moves to the first row otherwise. On error the screen is left empty rather
    /// than showing rows from an earlier update, and the error is handed back to
    /// the caller.
    pub async fn update(&mut self, gateway: &dyn Gateway, args: &[String]) -> Result<()> {
        self.title = title_for(self.id, args);
        if self.args != args {
            self.args = args.to_vec();
            self.focus = None;
        }
        match self.generate(gateway, args).await {
            Ok(content) => {
                self.content = content;
                self.render_items();
                self.set_focus(self.focus.or(Some(0)));
                Ok(())
            }
            Err(e) => {
                self.content = ScreenContent::Empty;
                self.items.clear();
                self.focus = None;
                Err(e)
            }
        }
    }

    async fn generate(&self, gateway: &dyn Gateway, args: &[String]) -> Result<ScreenContent> {
        let content = match self.id {
            ScreenId::Nil => ScreenContent::Empty,
            ScreenId::Vm => ScreenContent::Vms(extract::list_vms(gateway).await?),
            ScreenId::Props => {
                let vm = vm_arg(args)?;
                let entries = extract::vm_properties(gateway, vm).await?;
                ScreenContent::Props {
                    vm: vm.to_string(),
                    entries,
                }
            }
            ScreenId::Usb => {
                let vm = vm_arg(args)?;
                let devices = extract::usb_devices(gateway, vm).await?;
                ScreenContent::Usb {
                    vm: vm.to_string(),
                    devices,
                }
            }
        };
        Ok(content)
    }

    fn render_items(&mut self) {
        self.items = match &self.content {
            ScreenContent::Empty => Vec::new(),
            ScreenContent::Vms(vms) => vms
                .iter()
                .map(|vm| DisplayItem {
                    key: vm.name.clone(),
                    text: format!("{:<15}  {}", vm.state, vm.name),
                })
                .collect(),
            ScreenContent::Props { entries, .. } => entries
                .iter()
                .map(|entry| DisplayItem {
                    key: entry.key.clone(),
                    text: format!("{:<20} {}", format!("{}:", entry.key), entry.value),
                })
                .collect(),
            ScreenContent::Usb { devices, .. } => devices
                .iter()
                .map(|device| DisplayItem {
                    key: device.uuid.clone(),
                    text: usb_row(device, self.verbose),
                })
                .collect(),
        };
    }

    // === Focus ===

    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Move focus to `index`, clamped to the rows present.
    pub fn set_focus(&mut self, index: Option<usize>) {
        self.focus = match index {
            _ if self.items.is_empty() => None,
            Some(i) => Some(i.min(self.items.len() - 1)),
            None => None,
        };
    }

    pub fn move_focus_down(&mut self) {
        self.set_focus(Some(self.focus.map_or(0, |i| i + 1)));
    }

    pub fn move_focus_up(&mut self) {
        self.set_focus(Some(self.focus.map_or(0, |i| i.saturating_sub(1))));
    }

    /// Key of the focused row.
    pub fn current_selection(&self) -> Result<&str> {
        self.focus
            .and_then(|i| self.items.get(i))
            .map(|item| item.key.as_str())
            .ok_or(Error::NoSelection)
    }

    /// Replace the rows directly, keeping the focus where possible.
    pub fn replace_items(&mut self, items: Vec<DisplayItem>) {
        self.content = ScreenContent::Empty;
        self.items = items;
        self.set_focus(self.focus.or(Some(0)));
    }

    // === Screen-local commands ===

    /// Switch USB rows between the short and the detailed layout.
    pub fn toggle_verbose(&mut self) {
        if self.id != ScreenId::Usb {
            return;
        }
        self.verbose = !self.verbose;
        self.render_items();
    }

    /// Attach the focused USB device to the VM, or detach it if attached.
    ///
    /// The local flag is only flipped once VBoxManage accepted the command.
    /// Returns the new attachment state.
    pub async fn toggle_attachment(&mut self, gateway: &dyn Gateway) -> Result<bool> {
        let index = self.focus.ok_or(Error::NoSelection)?;
        let ScreenContent::Usb { vm, devices } = &mut self.content else {
            return Err(Error::NoSelection);
        };
        let device = devices.get_mut(index).ok_or(Error::NoSelection)?;

        let command = if device.attached {
            gateway::usb_detach(vm, &device.uuid)
        } else {
            gateway::usb_attach(vm, &device.uuid)
        };
        gateway.run(&command).await?;

        device.attached = !device.attached;
        let attached = device.attached;
        info!(vm = %vm, uuid = %device.uuid, attached, "Toggled USB attachment");

        let text = usb_row(device, self.verbose);
        if let Some(item) = self.items.get_mut(index) {
            item.text = text;
        }
        Ok(attached)
    }

    /// Open an edit popup for the focused property.
    pub fn begin_edit(&self) -> Result<PropertyEditModal> {
        let ScreenContent::Props { vm, entries } = &self.content else {
            return Err(Error::NoSelection);
        };
        let entry = self
            .focus
            .and_then(|i| entries.get(i))
            .ok_or(Error::NoSelection)?;
        let property =
            editable_property(&entry.key).ok_or_else(|| Error::NotEditable(entry.key.clone()))?;
        Ok(PropertyEditModal::new(vm.clone(), property, &entry.value))
    }

    /// Write `input` for property `label` through `modifyvm`, then mirror it
    /// locally. A failed command leaves the entry untouched.
    pub async fn apply_edit(
        &mut self,
        gateway: &dyn Gateway,
        label: &str,
        input: &str,
    ) -> Result<()> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidValue(format!("{} cannot be empty", label)));
        }
        let property =
            editable_property(label).ok_or_else(|| Error::NotEditable(label.to_string()))?;

        let ScreenContent::Props { vm, entries } = &mut self.content else {
            return Err(Error::NoSelection);
        };
        gateway
            .run(&gateway::modify_vm(vm, property.flag, input))
            .await?;
        info!(vm = %vm, property = %label, value = %input, "Modified VM");

        if let Some(entry) = entries.iter_mut().find(|e| e.key == label) {
            entry.value = property.display_value(input);
        }
        self.render_items();
        Ok(())
    }

    /// Attachment state of the device with `uuid`, if listed.
    pub fn usb_attached(&self, uuid: &str) -> Option<bool> {
        match &self.content {
            ScreenContent::Usb { devices, .. } => devices
                .iter()
                .find(|d| d.uuid == uuid)
                .map(|d| d.attached),
            _ => None,
        }
    }

    /// Current value of property `label`, if listed.
    pub fn property(&self, label: &str) -> Option<&str> {
        match &self.content {
            ScreenContent::Props { entries, .. } => entries
                .iter()
                .find(|e| e.key == label)
                .map(|e| e.value.as_str()),
            _ => None,
        }
    }
}

fn vm_arg(args: &[String]) -> Result<&str> {
    args.first()
        .map(String::as_str)
        .ok_or_else(|| Error::InvalidValue("missing VM name".to_string()))
}

fn title_for(id: ScreenId, args: &[String]) -> String {
    let vm = args.first().map(String::as_str).unwrap_or("-");
    match id {
        ScreenId::Nil => String::new(),
        ScreenId::Vm => "VM Selection".to_string(),
        ScreenId::Props => format!("Properties of {}", vm),
        ScreenId::Usb => format!("USB devices for {}", vm),
    }
}

/// First token of an id like `0x046d (046D)`.
fn short_id(id: &str) -> &str {
    id.split_whitespace().next().unwrap_or(id)
}

fn usb_row(device: &UsbDeviceRecord, verbose: bool) -> String {
    let mark = if device.attached { "[x]" } else { "[ ]" };
    if verbose {
        format!(
            "{} {:<24} {:<16} {}:{}  {}  {}",
            mark,
            device.product,
            device.manufacturer.as_deref().unwrap_or("-"),
            short_id(&device.vendor_id),
            short_id(&device.product_id),
            device.uuid,
            device.current_state
        )
    } else {
        format!(
            "{} {} ({}:{})",
            mark,
            device.product,
            short_id(&device.vendor_id),
            short_id(&device.product_id)
        )
    }
}

/// The registered screens, one per [`ScreenId`].
pub struct Screens {
    nil: Screen,
    vm: Screen,
    props: Screen,
    usb: Screen,
}

impl Screens {
    pub fn new() -> Self {
        Self {
            nil: Screen::new(ScreenId::Nil),
            vm: Screen::new(ScreenId::Vm),
            props: Screen::new(ScreenId::Props),
            usb: Screen::new(ScreenId::Usb),
        }
    }

    pub fn get(&self, id: ScreenId) -> &Screen {
        match id {
            ScreenId::Nil => &self.nil,
            ScreenId::Vm => &self.vm,
            ScreenId::Props => &self.props,
            ScreenId::Usb => &self.usb,
        }
    }

    pub fn get_mut(&mut self, id: ScreenId) -> &mut Screen {
        match id {
            ScreenId::Nil => &mut self.nil,
            ScreenId::Vm => &mut self.vm,
            ScreenId::Props => &mut self.props,
            ScreenId::Usb => &mut self.usb,
        }
    }
}

impl Default for Screens {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str) -> DisplayItem {
        DisplayItem {
            key: key.to_string(),
            text: key.to_string(),
        }
    }

    #[test]
    fn empty_screen_has_no_selection() {
        let screen = Screen::new(ScreenId::Vm);
        assert!(matches!(
            screen.current_selection(),
            Err(Error::NoSelection)
        ));
    }

    #[test]
    fn single_focused_item_is_selected() {
        let mut screen = Screen::new(ScreenId::Vm);
        screen.replace_items(vec![item("web")]);
        assert_eq!(screen.focus(), Some(0));
        assert_eq!(screen.current_selection().unwrap(), "web");
    }

    #[test]
    fn unfocused_list_has_no_selection() {
        let mut screen = Screen::new(ScreenId::Vm);
        screen.replace_items(vec![item("web"), item("db")]);
        screen.set_focus(None);
        assert!(matches!(
            screen.current_selection(),
            Err(Error::NoSelection)
        ));
    }

    #[test]
    fn focus_is_clamped() {
        let mut screen = Screen::new(ScreenId::Vm);
        screen.replace_items(vec![item("a"), item("b"), item("c")]);
        screen.move_focus_up();
        assert_eq!(screen.focus(), Some(0));
        screen.move_focus_down();
        screen.move_focus_down();
        screen.move_focus_down();
        assert_eq!(screen.focus(), Some(2));
        assert_eq!(screen.current_selection().unwrap(), "c");

        screen.replace_items(vec![item("a")]);
        assert_eq!(screen.focus(), Some(0));
        screen.replace_items(Vec::new());
        assert_eq!(screen.focus(), None);
    }

    #[test]
    fn usb_rows_show_attachment_mark() {
        let device = UsbDeviceRecord {
            uuid: "u1".into(),
            vendor_id: "0x046d (046D)".into(),
            product_id: "0xc52b (C52B)".into(),
            product: "USB Receiver".into(),
            manufacturer: Some("Logitech".into()),
            current_state: "Captured".into(),
            attached: true,
        };
        assert_eq!(usb_row(&device, false), "[x] USB Receiver (0x046d:0xc52b)");
        let verbose = usb_row(&device, true);
        assert!(verbose.contains("Logitech"));
        assert!(verbose.contains("u1"));
        assert!(verbose.ends_with("Captured"));
    }

    #[test]
    fn titles_name_the_vm() {
        assert_eq!(title_for(ScreenId::Vm, &[]), "VM Selection");
        assert_eq!(
            title_for(ScreenId::Usb, &["web".to_string()]),
            "USB devices for web"
        );
    }

    #[test]
    fn verbose_only_applies_to_usb() {
        let mut screen = Screen::new(ScreenId::Vm);
        screen.toggle_verbose();
        assert!(!screen.verbose);
        let mut usb = Screen::new(ScreenId::Usb);
        usb.toggle_verbose();
        assert!(usb.verbose);
    }
}
