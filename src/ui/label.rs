//! Monochrome battery labels drawn with `embedded-graphics`.
//!
//! Icon layout (relative to the label position):
//! ```text
//!  +------------------+-+
//!  | ## ## ## ##      |  |   20x10 outline, 2x4 nub
//!  +------------------+-+   up to four 3x6 bars
//! ```
//! Percentages use `FONT_6X10`, so "100%" is 24 px wide.

use crate::battery::glyph::{format_percentage, BatteryGlyph, LabelContent};
use crate::widget::{BatteryStatusWidget, Label, LabelFactory};
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, Triangle};
use embedded_graphics::text::{Baseline, Text};

const BODY: Size = Size::new(20, 10);
const NUB: Size = Size::new(2, 4);
const BAR: Size = Size::new(3, 6);
const BAR_PITCH: i32 = 4;

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

/// A label backed by a fixed screen position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextLabel {
    position: Point,
    content: LabelContent,
}

impl TextLabel {
    pub const fn new(position: Point) -> Self {
        Self {
            position,
            content: LabelContent::Blank,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn content(&self) -> LabelContent {
        self.content
    }

    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        match self.content {
            LabelContent::Blank => Ok(()),
            LabelContent::Percent(level) => {
                let text = format_percentage(level);
                Text::with_baseline(text.as_str(), self.position, text_style(), Baseline::Top)
                    .draw(target)?;
                Ok(())
            }
            LabelContent::Glyph(glyph) => draw_battery(target, self.position, glyph),
            LabelContent::Charging => draw_bolt(target, self.position),
        }
    }
}

impl Label for TextLabel {
    fn show(&mut self, content: LabelContent) {
        self.content = content;
    }
}

/// Places labels relative to the widget origin.
pub struct TextLabelFactory {
    pub origin: Point,
}

impl LabelFactory for TextLabelFactory {
    type Label = TextLabel;

    fn create(&mut self, x_offset: i32) -> TextLabel {
        TextLabel::new(self.origin + Point::new(x_offset, 0))
    }
}

/// Draw every label of `widget`.
pub fn draw_widget<D, const N: usize>(
    widget: &BatteryStatusWidget<TextLabel, N>,
    target: &mut D,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    for label in widget.labels() {
        label.draw(target)?;
    }
    Ok(())
}

fn draw_battery<D>(target: &mut D, origin: Point, glyph: BatteryGlyph) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Rectangle::new(origin, BODY)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)?;

    let nub_y = (BODY.height - NUB.height) as i32 / 2;
    Rectangle::new(origin + Point::new(BODY.width as i32, nub_y), NUB)
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(target)?;

    for bar in 0..i32::from(glyph.bars()) {
        Rectangle::new(origin + Point::new(2 + bar * BAR_PITCH, 2), BAR)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(target)?;
    }
    Ok(())
}

fn draw_bolt<D>(target: &mut D, origin: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let fill = PrimitiveStyle::with_fill(BinaryColor::On);
    Triangle::new(
        origin + Point::new(6, 0),
        origin + Point::new(1, 6),
        origin + Point::new(5, 6),
    )
    .into_styled(fill)
    .draw(target)?;
    Triangle::new(
        origin + Point::new(4, 4),
        origin + Point::new(8, 4),
        origin + Point::new(3, 9),
    )
    .into_styled(fill)
    .draw(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;

    fn render(content: LabelContent) -> MockDisplay<BinaryColor> {
        let mut label = TextLabel::new(Point::new(2, 2));
        label.show(content);
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        label.draw(&mut display).unwrap();
        display
    }

    fn lit(display: &MockDisplay<BinaryColor>, p: Point) -> bool {
        display.get_pixel(p) == Some(BinaryColor::On)
    }

    #[test]
    fn blank_label_draws_nothing() {
        let display = render(LabelContent::Blank);
        assert_eq!(display, MockDisplay::new());
    }

    #[test]
    fn battery_bars_follow_glyph() {
        // Inside the fourth bar: origin (2,2) + (2 + 3*4, 2).
        let fourth_bar = Point::new(2 + 14, 2 + 2);
        let first_bar = Point::new(2 + 2, 2 + 2);

        let full = render(LabelContent::Glyph(BatteryGlyph::Full));
        assert!(lit(&full, fourth_bar));
        assert!(lit(&full, first_bar));

        let quarter = render(LabelContent::Glyph(BatteryGlyph::Quarter));
        assert!(lit(&quarter, first_bar));
        assert!(!lit(&quarter, fourth_bar));

        let empty = render(LabelContent::Glyph(BatteryGlyph::Empty));
        assert!(!lit(&empty, first_bar));
        // Outline is always there.
        assert!(lit(&empty, Point::new(2, 2)));
    }

    #[test]
    fn percentage_fits_font_width() {
        let display = render(LabelContent::Percent(42));
        let area = display.affected_area();
        assert!(area.size.width > 0);
        assert!(area.size.width <= 18);
        assert!(area.top_left.x >= 2);
    }

    #[test]
    fn charging_marker_is_drawn() {
        let display = render(LabelContent::Charging);
        assert!(display.affected_area().size.width > 0);
    }

    #[test]
    fn factory_offsets_from_origin() {
        let mut factory = TextLabelFactory {
            origin: Point::new(0, 10),
        };
        assert_eq!(factory.create(35).position(), Point::new(35, 10));
    }
}
