//! Battery bookkeeping - pure logic, runs on the host as well as on target.
//!
//! - **glyph**: what a label shows for a level (icon steps / percentage)
//! - **level**: central supply voltage to percent
//! - **table**: fixed-size per-peripheral slot table and slot policies
//! - **status**: shared state, `BatteryEvent` handling and polling

pub mod glyph;
pub mod level;
pub mod status;
pub mod table;

pub use glyph::{BatteryGlyph, DisplayMode, LabelContent};
pub use status::{BatteryEvent, BatteryLevelSource, BatteryStatus, LatestLevels};
pub use table::{BatteryTable, SlotPolicy};
