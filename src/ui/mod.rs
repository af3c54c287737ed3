//! User interface subsystem - battery widget on the SSD1306 OLED.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×32 (0.91") OLED via I²C
//! - **Label**: battery icons / percentages drawn with `embedded-graphics`
//!   (lives in the library so it can be tested on the host)

pub mod display;

pub use dongle_display::ui::label;
