// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serial port discovery for `--list`.

use serialport::{SerialPortInfo, SerialPortType};

/// One serial port as shown to the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSummary {
    pub path: String,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

impl PortSummary {
    /// True when the USB manufacturer string mentions Arduino.
    pub fn looks_like_arduino(&self) -> bool {
        self.manufacturer
            .as_deref()
            .is_some_and(|m| m.to_ascii_lowercase().contains("arduino"))
    }
}

impl From<SerialPortInfo> for PortSummary {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                path: info.port_name,
                manufacturer: usb.manufacturer,
                serial_number: usb.serial_number,
                vendor_id: Some(usb.vid),
                product_id: Some(usb.pid),
            },
            _ => Self {
                path: info.port_name,
                ..Default::default()
            },
        }
    }
}

/// Enumerate serial ports on this machine.
pub fn list_ports() -> Result<Vec<PortSummary>, serialport::Error> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(PortSummary::from)
        .collect())
}

/// Port to suggest: the first Arduino, otherwise the first port.
///
/// The flag is true when the pick was identified as an Arduino.
pub fn recommend(ports: &[PortSummary]) -> Option<(&PortSummary, bool)> {
    ports
        .iter()
        .find(|p| p.looks_like_arduino())
        .map(|p| (p, true))
        .or_else(|| ports.first().map(|p| (p, false)))
}

/// Print the port table and a suggested command line.
pub fn print_ports(ports: &[PortSummary], baud: u32) {
    if ports.is_empty() {
        println!("No serial ports found!");
        println!();
        println!("Troubleshooting:");
        println!("  1. Connect the device with a USB cable");
        println!("  2. Check that the device is powered on");
        println!("  3. Try a different USB cable");
        return;
    }

    println!("Found {} serial port(s):", ports.len());
    println!();

    for (i, port) in ports.iter().enumerate() {
        println!("Port {}:", i + 1);
        println!("  Path:           {}", port.path);
        println!("  Manufacturer:   {}", or_unknown(port.manufacturer.as_deref()));
        println!("  Serial Number:  {}", or_unknown(port.serial_number.as_deref()));
        println!("  Vendor ID:      {}", hex_or_unknown(port.vendor_id));
        println!("  Product ID:     {}", hex_or_unknown(port.product_id));
        if port.looks_like_arduino() {
            println!("  * This looks like an Arduino");
        }
        println!();
    }

    let Some((port, identified)) = recommend(ports) else {
        return;
    };
    if identified {
        println!("Recommended port: {}", port.path);
        println!();
        println!("Usage:");
    } else {
        println!("Could not identify an Arduino port automatically.");
        println!();
        println!("Try the first port:");
    }
    println!("  anglecast-bridge {} {}", port.path, baud);
}

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("(Unknown)")
}

fn hex_or_unknown(value: Option<u16>) -> String {
    value.map_or_else(|| "(Unknown)".to_string(), |v| format!("{:04x}", v))
}
