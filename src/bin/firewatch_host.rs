//! Firewatch Host CLI
//!
//! This binary runs on your PC, pulls the latest readings from the field
//! gateway over USB (or from a JSON snapshot) and shows the fire-risk
//! assessment of every device in an interactive shell.
//!
//! ## Usage
//!
//! ```bash
//! # List available serial ports
//! cargo run --bin firewatch_host -- --list-ports
//!
//! # Connect to gateway (auto-detects RP2350)
//! cargo run --bin firewatch_host
//!
//! # Connect to specific port
//! cargo run --bin firewatch_host -- --port /dev/ttyACM0
//!
//! # Replay a snapshot file, print the summary once and exit
//! cargo run --bin firewatch_host -- --file snapshot.json --once
//!
//! # Refresh every 10 seconds and print the summary each time
//! cargo run --bin firewatch_host -- --watch 10
//!
//! # Refresh every 5 seconds while a fire is being tracked
//! cargo run --bin firewatch_host -- --watch --incident
//! ```
//!
//! `--low-power` polls every 5 minutes instead. An explicit `--watch <secs>`
//! wins over both.
//!
//! ## Commands
//!
//! - `refresh` - Fetch readings and re-evaluate every device
//! - `summary` - Show fleet averages and risk level counts
//! - `devices` - Show every device with its risk level
//! - `device <id>` - Show one device with per-criterion points
//! - `filter <field> <op> <value> [...]` - Filter devices by reading or risk
//! - `watch [n]` - Refresh on the configured interval, n times (default: 10)
//! - `stats` - Show refresh counters
//! - `diag` - Show gateway diagnostics
//! - `help` - Show help
//! - `exit` - Exit shell
//!
//! Environment variables (see `HostConfig`) provide defaults; `RUST_LOG`
//! controls log output.

use std::io::{self, Write};
use std::time::{Duration, UNIX_EPOCH};

use serialport::SerialPort;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use firewatch::adapters::{find_gateway_port, list_ports, GatewayDiagnostics};
use firewatch::domain::risk::Criterion;
use firewatch::query::parse_query;
use firewatch::{
    DeviceAssessment, DeviceId, FeedError, FleetSummary, HostConfig, JsonFileFeed, Monitor,
    RefreshConfig, RiskLevel, SensorFeedPort, SerialFeedAdapter, Snapshot,
};

/// Feeds the shell can drive
trait ShellFeed: SensorFeedPort {
    fn diagnostics(&mut self) -> Result<Option<GatewayDiagnostics>, FeedError> {
        Ok(None)
    }
}

impl ShellFeed for JsonFileFeed {}

impl ShellFeed for SerialFeedAdapter<Box<dyn SerialPort>> {
    fn diagnostics(&mut self) -> Result<Option<GatewayDiagnostics>, FeedError> {
        SerialFeedAdapter::diagnostics(self).map(Some)
    }
}

enum Mode {
    Shell,
    Once,
    Watch(Option<u64>),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--list-ports") {
        print_ports();
        return Ok(());
    }

    let mut config = HostConfig::load()?;

    if let Some(port) = flag_value(&args, "--port") {
        config.port = Some(port);
    }
    if let Some(file) = flag_value(&args, "--file") {
        config.feed_file = Some(file.into());
    }
    if args.iter().any(|a| a == "--incident") {
        config.refresh = RefreshConfig::incident();
    } else if args.iter().any(|a| a == "--low-power") {
        config.refresh = RefreshConfig::low_power();
    }

    let mode = if args.iter().any(|a| a == "--once") {
        Mode::Once
    } else if let Some(idx) = args.iter().position(|a| a == "--watch") {
        if let Some(secs) = args.get(idx + 1).and_then(|s| s.parse::<u64>().ok()) {
            config.refresh = RefreshConfig::every(Duration::from_secs(secs.max(1)));
        }
        Mode::Watch(None)
    } else {
        Mode::Shell
    };

    if let Some(path) = config.feed_file.clone() {
        info!("Reading snapshots from {}", path.display());
        let feed = JsonFileFeed::new(&path, config.calibration);
        return run(Monitor::new(feed, config.refresh), mode);
    }

    let port_name = match config.port.clone().or_else(find_gateway_port) {
        Some(name) => name,
        None => {
            eprintln!("Error: No Firewatch gateway found");
            eprintln!("Use --list-ports to see available ports");
            eprintln!("Or specify port with --port <PORT> or --file <SNAPSHOT>");
            return Err(FeedError::NotConnected.into());
        }
    };

    // On Windows, COM ports >= 10 need the \\.\COMxx format
    #[cfg(target_os = "windows")]
    let port_name = if port_name.starts_with("COM") && !port_name.starts_with(r"\\") {
        format!(r"\\.\{}", port_name)
    } else {
        port_name
    };

    print!("Connecting to {}...", port_name);
    io::stdout().flush()?;

    let mut feed =
        SerialFeedAdapter::open(&port_name, config.baud_rate, config.timeout, config.calibration)?;
    println!(" opened!");

    match feed.ping() {
        Ok(()) => println!("Gateway ready!"),
        Err(e) => {
            println!("Warning: Gateway did not answer ping ({e})");
            println!("Proceeding anyway...");
        }
    }

    run(Monitor::new(feed, config.refresh), mode)
}

fn run<F: ShellFeed>(mut monitor: Monitor<F>, mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
    match mode {
        Mode::Once => {
            let snapshot = monitor.tick()?;
            display_summary(snapshot.summary.as_ref());
            display_devices(&snapshot.assessments.iter().collect::<Vec<_>>());
            Ok(())
        }
        Mode::Watch(max_ticks) => {
            monitor.run(max_ticks, display_snapshot);
            Ok(())
        }
        Mode::Shell => shell(&mut monitor),
    }
}

fn shell<F: ShellFeed>(monitor: &mut Monitor<F>) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = monitor.tick() {
        eprintln!("Error: {}", e);
    }

    println!("\nFirewatch Risk Shell");
    println!("Type 'help' for commands, 'exit' to quit\n");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            break;
        }

        if input == "help" {
            print_help();
            continue;
        }

        if let Err(e) = execute_command(monitor, input) {
            eprintln!("Error: {}", e);
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn execute_command<F: ShellFeed>(
    monitor: &mut Monitor<F>,
    input: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let parts: Vec<&str> = input.split_whitespace().collect();

    match parts[0] {
        "refresh" | "r" => {
            let snapshot = monitor.tick()?;
            println!("Refreshed {} devices", snapshot.assessments.len());
        }

        "summary" | "sum" => display_summary(latest(monitor)?.summary.as_ref()),

        "devices" | "ls" => {
            let snapshot = latest(monitor)?;
            display_devices(&snapshot.assessments.iter().collect::<Vec<_>>());
        }

        "device" | "get" => {
            let id = parts
                .get(1)
                .ok_or("Usage: device <id>")?
                .parse::<u16>()
                .map_err(|_| "Invalid ID (must be a positive number)")?;
            let snapshot = latest(monitor)?;
            match snapshot
                .assessments
                .iter()
                .find(|e| e.device.id == DeviceId(id))
            {
                Some(entry) => display_device(entry),
                None => println!("Device {} not found", id),
            }
        }

        "filter" | "where" | "query" => {
            let query = parse_query(&parts[1..])?;
            let snapshot = latest(monitor)?;
            display_devices(&query.apply(&snapshot.assessments));
        }

        "watch" => {
            let ticks = match parts.get(1) {
                Some(n) => n.parse::<u64>().map_err(|_| "Invalid count")?,
                None => 10,
            };
            monitor.run(Some(ticks.max(1)), display_snapshot);
        }

        "stats" => {
            let stats = monitor.stats();
            println!("\nRefresh Statistics:");
            println!("{:-<50}", "");
            println!("Interval:           {:?}", monitor.config().interval);
            println!("Ticks:              {}", stats.ticks);
            println!("Failed fetches:     {}", stats.failed_fetches);
            println!("Overruns:           {}", stats.overruns);
            println!("Slowest tick:       {:?}", stats.slowest_tick);
            println!("{:-<50}", "");
        }

        "diag" | "diagnostics" => match monitor.feed_mut().diagnostics()? {
            Some(diag) => display_diagnostics(&diag),
            None => println!("Diagnostics are only available from a gateway"),
        },

        cmd => return Err(format!("Unknown command: {}", cmd).into()),
    }

    Ok(())
}

fn latest<F: ShellFeed>(monitor: &Monitor<F>) -> Result<&Snapshot, &'static str> {
    monitor
        .latest()
        .ok_or("No readings yet - use 'refresh' to fetch")
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).cloned()
}

fn print_ports() {
    println!("Available serial ports:");
    match list_ports() {
        Ok(ports) => {
            if ports.is_empty() {
                println!("  (none)");
            }
            for port in ports {
                print!("  {}", port.port_name);
                match &port.port_type {
                    serialport::SerialPortType::UsbPort(info) => {
                        println!(" - USB (VID: 0x{:04x}, PID: 0x{:04x})", info.vid, info.pid);
                        if let Some(ref product) = info.product {
                            println!("      Product: {}", product);
                        }
                        if let Some(ref serial) = info.serial_number {
                            println!("      Serial: {}", serial);
                        }
                    }
                    serialport::SerialPortType::BluetoothPort => println!(" - Bluetooth"),
                    serialport::SerialPortType::PciPort => println!(" - PCI"),
                    serialport::SerialPortType::Unknown => println!(" - Unknown"),
                }
            }
        }
        Err(e) => {
            error!("Error listing ports: {}", e);
        }
    }
}

fn display_snapshot(snapshot: &Snapshot) {
    display_summary(snapshot.summary.as_ref());
    let urgent: Vec<&DeviceAssessment> = snapshot
        .assessments
        .iter()
        .filter(|e| e.assessment.risk_level >= RiskLevel::High)
        .collect();
    if !urgent.is_empty() {
        println!("Devices at high or critical risk:");
        display_devices(&urgent);
    }
}

fn display_summary(summary: Option<&FleetSummary>) {
    let Some(s) = summary else {
        println!("No devices reported");
        return;
    };

    println!("\nFleet Summary ({} devices):", s.device_count);
    println!("{:-<50}", "");
    println!("Temperature:        {:.1} °C", s.mean_temperature);
    println!("Air humidity:       {:.0} %", s.mean_air_humidity);
    println!("Soil humidity:      {:.0} %", s.mean_soil_humidity);
    println!("Heat index:         {:.1} °C", s.mean_heat_index);
    println!("Smoke:              {:.1} %", s.mean_smoke_percent);
    println!("{:-<50}", "");
    for level in RiskLevel::ALL {
        println!("{:<20}{}", format!("{}:", level), s.count(level));
    }
    println!("Highest risk:       device {}", s.riskiest);
    println!("{:-<50}", "");
}

fn display_devices(entries: &[&DeviceAssessment]) {
    println!("\nDevices ({}):", entries.len());
    println!("{:-<92}", "");
    println!(
        "{:>5} {:<16} {:>8} {:>8} {:>8} {:>8} {:>8} {:>7} {:>10}",
        "ID", "Name", "Temp", "Air %", "Soil %", "Heat", "Smoke %", "Risk %", "Level"
    );
    println!("{:-<92}", "");

    for entry in entries {
        let r = &entry.device.reading;
        println!(
            "{:>5} {:<16} {:>8.1} {:>8.0} {:>8.1} {:>8.1} {:>8.1} {:>7} {:>10}",
            entry.device.id,
            truncate(&entry.device.name, 16),
            r.temperature,
            r.air_humidity,
            r.soil_humidity,
            r.heat_index,
            r.smoke(),
            entry.assessment.risk_percent,
            entry.assessment.risk_level
        );
    }

    println!("{:-<92}", "");
}

fn display_device(entry: &DeviceAssessment) {
    let d = &entry.device;
    let a = &entry.assessment;

    println!("\nDevice {} ({}):", d.id, d.name);
    println!("{:-<50}", "");
    println!(
        "Location:           {:.5}, {:.5}",
        d.location.latitude, d.location.longitude
    );
    println!("Reported:           {}", format_timestamp(d.timestamp_s));
    for criterion in Criterion::ALL {
        println!(
            "{:<20}{:>8.1}  ({} pts)",
            format!("{}:", criterion.as_str()),
            criterion.value_of(&d.reading),
            a.sub_scores.get(criterion)
        );
    }
    println!("{:-<50}", "");
    println!("Risk points:        {} / 15", a.risk_points);
    println!("Risk percent:       {} %", a.risk_percent);
    println!("Risk level:         {}", a.risk_level);
    println!("{:-<50}", "");
}

fn display_diagnostics(diag: &GatewayDiagnostics) {
    println!("\nGateway Diagnostics:");
    println!("{:-<50}", "");
    println!("Uptime:             {:.2} seconds", diag.uptime_ms as f64 / 1000.0);
    println!("Devices known:      {}", diag.devices_known);
    println!("Devices reporting:  {}", diag.devices_reporting);
    println!("Packets dropped:    {}", diag.packets_dropped);
    println!("{:-<50}", "");

    if diag.devices_reporting < diag.devices_known {
        println!(
            "WARNING: {} devices have not reported",
            diag.devices_known - diag.devices_reporting
        );
    }
}

/// Format Unix seconds as seconds-ago relative to now
fn format_timestamp(timestamp_s: i64) -> String {
    if timestamp_s <= 0 {
        return "unknown".to_string();
    }

    let now = std::time::SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let age = now - timestamp_s;

    if age < 0 {
        format!("{} (in the future)", timestamp_s)
    } else if age < 120 {
        format!("{} ({} s ago)", timestamp_s, age)
    } else {
        format!("{} ({} min ago)", timestamp_s, age / 60)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).chain(std::iter::once('~')).collect()
    }
}

fn print_help() {
    println!("Commands:");
    println!("  refresh                  - Fetch readings and re-evaluate every device");
    println!("  summary                  - Show fleet averages and risk level counts");
    println!("  devices                  - Show every device with its risk level");
    println!("  device <id>              - Show one device with per-criterion points");
    println!("  filter <conditions>      - Filter devices (see below)");
    println!("  watch [n]                - Refresh on the interval, n times (default: 10)");
    println!("  stats                    - Show refresh counters");
    println!("  diag                     - Show gateway diagnostics");
    println!("  help                     - Show this help");
    println!("  exit                     - Exit shell");
    println!();
    println!("Filter Syntax:");
    println!("  filter <field> <op> <value> [<field> <op> <value>...] [--limit N]");
    println!();
    println!("  Fields:");
    println!("    temp, air, soil, heat, smoke, percent, points, level");
    println!();
    println!("  Operators:");
    println!("    =, !=, <, <=, >, >=  (or: eq, ne, lt, le, gt, ge)");
    println!();
    println!("Examples:");
    println!("  filter level >= high            - Devices at high or critical risk");
    println!("  filter smoke > 6                - Devices smelling smoke");
    println!("  filter soil < 10 air < 20       - Dry soil and dry air");
    println!("  filter percent > 50 --limit 5   - First 5 devices above 50%");
}
