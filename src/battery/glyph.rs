//! What a battery label shows for a given charge level.
//!
//! Icon thresholds (percent):
//! ```text
//! 95..=100  Full
//! 70..=94   ThreeQuarters
//! 45..=69   Half
//! 20..=44   Quarter
//!  0..=19   Empty
//! ```

use core::fmt::Write;
use heapless::String;

/// Longest percentage text, "100%".
pub const PERCENT_TEXT_LEN: usize = 5;

/// Five-step battery icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryGlyph {
    Full,
    ThreeQuarters,
    Half,
    Quarter,
    Empty,
}

impl BatteryGlyph {
    /// Number of filled bars drawn inside the battery outline.
    pub const fn bars(self) -> u8 {
        match self {
            BatteryGlyph::Full => 4,
            BatteryGlyph::ThreeQuarters => 3,
            BatteryGlyph::Half => 2,
            BatteryGlyph::Quarter => 1,
            BatteryGlyph::Empty => 0,
        }
    }
}

/// Icon vs. numeric rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayMode {
    Icon,
    Percentage,
}

/// Content of a single label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LabelContent {
    /// Nothing to show (slot inactive).
    #[default]
    Blank,
    Glyph(BatteryGlyph),
    Percent(u8),
    /// Central runs from USB power.
    Charging,
}

pub fn glyph_for_level(level: u8) -> BatteryGlyph {
    match level.min(100) {
        95..=100 => BatteryGlyph::Full,
        70..=94 => BatteryGlyph::ThreeQuarters,
        45..=69 => BatteryGlyph::Half,
        20..=44 => BatteryGlyph::Quarter,
        _ => BatteryGlyph::Empty,
    }
}

/// Format a level as `"NN%"`, clamped to 100.
pub fn format_percentage(level: u8) -> String<PERCENT_TEXT_LEN> {
    let mut text = String::new();
    // "100%" always fits the buffer.
    let _ = write!(&mut text, "{}%", level.min(100));
    text
}

/// Content for an active slot holding `level`.
pub fn label_content(level: u8, mode: DisplayMode) -> LabelContent {
    match mode {
        DisplayMode::Icon => LabelContent::Glyph(glyph_for_level(level)),
        DisplayMode::Percentage => LabelContent::Percent(level.min(100)),
    }
}
