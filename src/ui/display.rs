//! SSD1306 OLED display wrapper.

use crate::ui::label::{draw_widget, TextLabel};
use dongle_display::config::DISPLAY_I2C_ADDRESS;
use dongle_display::error::Error;
use dongle_display::widget::WidgetRegistry;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x32, BufferedGraphicsMode<DisplaySize128x32>>;

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Result<Display<I2C>, Error>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new_custom_address(i2c, DISPLAY_I2C_ADDRESS);
    let mut display = Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    display.init().map_err(|_| Error::Display)?;
    display.clear_buffer();
    display.flush().map_err(|_| Error::Display)?;
    Ok(display)
}

/// Redraw every widget in `registry` and push the frame to the panel.
pub fn draw_widgets<I2C, const N: usize, const W: usize>(
    display: &mut Display<I2C>,
    registry: &WidgetRegistry<TextLabel, N, W>,
) -> Result<(), Error>
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();
    for widget in registry.widgets() {
        draw_widget(widget, display).map_err(|_| Error::Display)?;
    }
    display.flush().map_err(|_| Error::Display)
}
