//! Host-testable library interface for dongle-display.
//!
//! This crate root exposes the pure logic - battery bookkeeping, slot
//! policies, the widget and its label rendering - so it can be tested
//! on the host (no embedded hardware required).
//!
//! Usage: `cargo test --lib`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and pulls these modules in through the library.

#![cfg_attr(not(test), no_std)]

pub mod battery;
pub mod config;
pub mod error;
pub mod widget;

// Internal module paths for the implementations that share a directory
// with embedded-only code
#[path = "ble/adv_parser.rs"]
mod ble_adv_parser_impl;
#[path = "ble/link_slots.rs"]
mod ble_link_slots_impl;
#[path = "ui/label.rs"]
mod ui_label_impl;

pub mod ble {
    pub mod adv_parser {
        pub use crate::ble_adv_parser_impl::*;
    }
    pub mod link_slots {
        pub use crate::ble_link_slots_impl::*;
    }
}

pub mod ui {
    pub mod label {
        pub use crate::ui_label_impl::*;
    }
}

pub use battery::{BatteryEvent, BatteryStatus};
pub use error::{BleError, Error};
pub use widget::{BatteryStatusWidget, WidgetRegistry};

// ═══════════════════════════════════════════════════════════════════════════
// Scenario Tests - one per display variation
// ═══════════════════════════════════════════════════════════════════════════
