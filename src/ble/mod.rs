//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Central** role:
//!
//! 1. **Scanner** - discovers nearby peripherals advertising the Battery
//!    Service (0x180F).
//! 2. **Battery Client** - reads and subscribes to the Battery Level
//!    characteristic (0x2A19) of a connected peripheral.
//! 3. **Central** - assigns peripherals to link slots, runs one link task
//!    per slot and turns readings into `BatteryEvent`s for the display.
//!
//! `adv_parser` and `link_slots` are pure and live in the library so they
//! can be tested on the host.

pub mod battery_client;
pub mod central;
pub mod scanner;

pub use dongle_display::ble::{adv_parser, link_slots};

use defmt::Format;
use dongle_display::error::BleError;
use heapless::String;
use nrf_softdevice::ble::Address;

/// Information about a discovered BLE peripheral.
#[derive(Clone, Format)]
pub struct DiscoveredPeripheral {
    /// BLE address.
    pub address: Address,
    /// Human-readable name (truncated to 32 bytes for `heapless::String`).
    pub name: String<32>,
    /// Received Signal Strength Indicator (dBm).
    pub rssi: i8,
}

/// Outcome reports from the per-slot link tasks to the central manager.
#[derive(Clone, Copy, Format)]
pub enum LinkEvent {
    /// Connected and subscribed to battery notifications.
    Connected { slot: usize },
    /// An established link went away.
    Disconnected { slot: usize },
    /// The connection attempt failed before it was established.
    Failed { slot: usize, error: BleError },
}

impl LinkEvent {
    pub fn slot(&self) -> usize {
        match *self {
            LinkEvent::Connected { slot }
            | LinkEvent::Disconnected { slot }
            | LinkEvent::Failed { slot, .. } => slot,
        }
    }
}
