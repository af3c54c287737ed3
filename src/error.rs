//! Unified error type for dongle-display.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Battery table
    /// A reading named a slot beyond the configured peripheral count.
    SlotOutOfRange { index: usize },

    /// Every slot is occupied and the policy found no slot to reuse.
    NoFreeSlot,

    /// The event kind is disabled by the current widget configuration
    /// (e.g. central readings while the central label is hidden).
    NotSupported,

    // Widgets
    /// The widget list is full.
    WidgetLimit,

    /// No widget is registered under the given id.
    UnknownWidget,

    // Hardware
    /// I²C transaction to the display failed.
    Display,

    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// Scan was cancelled or could not start.
    ScanFailed,
    /// Connection attempt failed.
    ConnectFailed,
    /// The peripheral exposes no Battery Service.
    DiscoveryFailed,
    /// Battery Level read or subscribe failed.
    NotifyFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}
