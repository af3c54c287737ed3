//! Application-wide constants and compile-time configuration.
//!
//! Display policy, slot handling, timing and pin assignments live here so
//! they can be tuned in one place. `WidgetConfig::from_build_config()`
//! turns the widget-related constants into a runtime value.

use crate::battery::glyph::DisplayMode;
use crate::battery::table::SlotPolicy;

// Battery slots

/// Upper bound on peripheral slots the widget supports.
pub const MAX_SLOTS: usize = 4;

/// Number of wirelessly-paired peripherals (split halves) shown.
pub const PERIPHERAL_COUNT: usize = 2;

const _: () = assert!(PERIPHERAL_COUNT >= 1 && PERIPHERAL_COUNT <= MAX_SLOTS);

/// How peripheral readings map onto slots.
pub const SLOT_POLICY: SlotPolicy = SlotPolicy::Indexed;

/// Largest level difference (percentage points) still treated as "the
/// same device" by `SlotPolicy::NearestLevel`.
pub const NEAREST_MATCH_TOLERANCE: u8 = 10;

// Display

/// Render icons or numeric percentages.
pub const DISPLAY_MODE: DisplayMode = DisplayMode::Icon;

/// Show the central's own battery level / USB power state.
pub const SHOW_CENTRAL: bool = false;

/// Horizontal distance between neighbouring battery labels (pixels).
pub const LABEL_SPACING_PX: i32 = 35;

/// Top-left corner of the widget on the 128x32 panel.
pub const WIDGET_ORIGIN_X: i32 = 0;
pub const WIDGET_ORIGIN_Y: i32 = 10;

/// Panel width of the SSD1306 128x32.
pub const DISPLAY_WIDTH_PX: i32 = 128;

/// Widest label: "100%" in `FONT_6X10` (the icon is 22 px).
pub const LABEL_WIDTH_PX: i32 = 24;

/// Room for the label row, right of the widget origin.
pub const LABEL_ROW_WIDTH_PX: i32 = DISPLAY_WIDTH_PX - WIDGET_ORIGIN_X;

// Every slot plus the central label must fit without overlapping once the
// spacing is squeezed to the row width.
const _: () = assert!((LABEL_ROW_WIDTH_PX - LABEL_WIDTH_PX) / MAX_SLOTS as i32 >= LABEL_WIDTH_PX);

/// Number of displays (widget instances) that can listen at once.
pub const MAX_WIDGETS: usize = 2;

// Refresh

/// How the display is refreshed after a battery reading changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshMode {
    /// Redraw immediately on every battery event.
    EventDriven,
    /// Collect readings and redraw from a periodic timer.
    Polling,
}

pub const REFRESH_MODE: RefreshMode = RefreshMode::EventDriven;

/// Period of the polling refresh timer (ms).
pub const POLL_PERIOD_MS: u64 = 1000;

// BLE

/// Duration of a BLE scan window (seconds).
pub const BLE_SCAN_DURATION_SECS: u64 = 10;

/// Maximum number of BLE peripherals we keep from one scan.
pub const BLE_MAX_DISCOVERED: usize = 8;

/// Only peripherals whose advertised name starts with this prefix are
/// connected. Empty string accepts every Battery Service advertiser.
pub const PERIPHERAL_NAME_PREFIX: &str = "";

/// Pause between scan rounds while some slots are still free (seconds).
pub const BLE_RESCAN_INTERVAL_SECS: u64 = 5;

/// BLE connection interval range (in 1.25 ms units).
/// Battery notifications are rare, so a relaxed interval is fine.
pub const BLE_CONN_INTERVAL_MIN: u16 = 24;
pub const BLE_CONN_INTERVAL_MAX: u16 = 40;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 4;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

// Central battery

/// Interval between SAADC samples of the central's own supply (seconds).
pub const CENTRAL_BATTERY_SAMPLE_SECS: u64 = 60;

// GPIO pin assignments (nRF52840 dongle defaults)
//
//   I²C SDA  → P0.17
//   I²C SCL  → P0.20
//
// Concrete `embassy_nrf::peripherals::*` types are chosen in `main.rs`.

/// SSD1306 I²C address.
pub const DISPLAY_I2C_ADDRESS: u8 = 0x3C;

/// Runtime view of the widget-related constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WidgetConfig {
    pub display_mode: DisplayMode,
    pub slot_policy: SlotPolicy,
    pub show_central: bool,
    pub nearest_tolerance: u8,
    pub label_spacing: i32,
}

impl WidgetConfig {
    pub const fn from_build_config() -> Self {
        Self {
            display_mode: DISPLAY_MODE,
            slot_policy: SLOT_POLICY,
            show_central: SHOW_CENTRAL,
            nearest_tolerance: NEAREST_MATCH_TOLERANCE,
            label_spacing: LABEL_SPACING_PX,
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self::from_build_config()
    }
}
