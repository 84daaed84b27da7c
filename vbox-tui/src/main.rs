use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

use vbox_tui::extract::{self, PropertyEntry, UsbDeviceRecord, VmSummary};
use vbox_tui::gateway::{self, VBoxManage};
use vbox_tui::tui;

#[derive(Parser)]
#[command(name = "vbox-tui")]
#[command(about = "Terminal browser for VirtualBox VMs", long_about = None)]
struct Cli {
    /// Path to the VBoxManage executable
    #[arg(long, default_value = gateway::DEFAULT_PROGRAM)]
    vboxmanage: PathBuf,

    /// Write logs to this file (the UI owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Timer tick of the UI loop in milliseconds
    #[arg(long, default_value = "250")]
    tick_ms: u64,

    /// Seconds a status message stays visible
    #[arg(long, default_value = "5")]
    status_timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all VMs with their state
    List,

    /// Show VM properties
    Info {
        /// VM name
        vm: String,
    },

    /// List host USB devices and whether they are attached to a VM
    Usb {
        /// VM name
        vm: String,
    },
}

#[derive(Tabled)]
struct VmRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
}

impl From<VmSummary> for VmRow {
    fn from(vm: VmSummary) -> Self {
        Self {
            name: vm.name,
            state: vm.state,
        }
    }
}

#[derive(Tabled)]
struct PropertyRow {
    #[tabled(rename = "PROPERTY")]
    key: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

impl From<PropertyEntry> for PropertyRow {
    fn from(entry: PropertyEntry) -> Self {
        Self {
            key: entry.key,
            value: entry.value,
        }
    }
}

#[derive(Tabled)]
struct UsbRow {
    #[tabled(rename = "ATTACHED")]
    attached: String,
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "VENDOR")]
    vendor_id: String,
    #[tabled(rename = "PRODUCT ID")]
    product_id: String,
    #[tabled(rename = "PRODUCT")]
    product: String,
    #[tabled(rename = "MANUFACTURER")]
    manufacturer: String,
    #[tabled(rename = "STATE")]
    state: String,
}

impl From<UsbDeviceRecord> for UsbRow {
    fn from(device: UsbDeviceRecord) -> Self {
        Self {
            attached: if device.attached { "yes" } else { "no" }.to_string(),
            uuid: device.uuid,
            vendor_id: device.vendor_id,
            product_id: device.product_id,
            product: device.product,
            manufacturer: device.manufacturer.unwrap_or_else(|| "-".to_string()),
            state: device.current_state,
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env().add_directive("vbox_tui=info".parse()?);
    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        // Without a log file only the one-shot commands log, to stderr
        None if cli.command.is_some() => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

fn print_table<T: Tabled>(rows: Vec<T>, empty: &str) {
    if rows.is_empty() {
        println!("{}", empty);
    } else {
        println!("{}", Table::new(rows));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let gateway = VBoxManage::new(cli.vboxmanage.clone());

    let Some(command) = cli.command else {
        let config = tui::Config {
            tick_rate: Duration::from_millis(cli.tick_ms),
            status_timeout: Duration::from_secs(cli.status_timeout),
        };
        tui::run(Box::new(gateway), config).await?;
        return Ok(());
    };

    let result = match command {
        Commands::List => extract::list_vms(&gateway)
            .await
            .map(|vms| print_table(vms.into_iter().map(VmRow::from).collect(), "No VMs found")),
        Commands::Info { vm } => extract::vm_properties(&gateway, &vm).await.map(|props| {
            print_table(
                props.into_iter().map(PropertyRow::from).collect(),
                "No properties found",
            )
        }),
        Commands::Usb { vm } => extract::usb_devices(&gateway, &vm).await.map(|devices| {
            print_table(
                devices.into_iter().map(UsbRow::from).collect(),
                "No USB devices found",
            )
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
