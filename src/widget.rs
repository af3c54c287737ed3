//! Battery status widget - label bookkeeping on top of `BatteryStatus`.
//!
//! A widget owns one label per peripheral slot plus an optional central
//! label. Labels are laid out right to left: slot 0 is rightmost and each
//! higher slot sits `label_spacing` pixels further left. The central label
//! (when enabled) is placed right of slot 0. When the row would run past
//! the panel edge the spacing is narrowed to fit.
//!
//! Several widgets (one per display) can be attached to a
//! `WidgetRegistry`; they all render the same shared state.

use crate::battery::glyph::{label_content, LabelContent};
use crate::battery::status::{BatteryEvent, BatteryLevelSource, BatteryStatus};
use crate::config::{WidgetConfig, LABEL_ROW_WIDTH_PX, LABEL_WIDTH_PX};
use crate::error::Error;
use heapless::Vec;

/// A single on-screen text/icon object.
pub trait Label {
    fn show(&mut self, content: LabelContent);
}

/// Creates labels at a horizontal offset from the widget origin.
pub trait LabelFactory {
    type Label: Label;

    fn create(&mut self, x_offset: i32) -> Self::Label;
}

/// Horizontal offset of the label for peripheral slot `index`.
pub const fn slot_offset(index: usize, slots: usize, spacing: i32) -> i32 {
    (slots - 1 - index) as i32 * spacing
}

/// `spacing`, narrowed so that `labels` labels end inside the label row.
pub const fn fitted_spacing(labels: usize, spacing: i32) -> i32 {
    if labels < 2 {
        return spacing;
    }
    let room = (LABEL_ROW_WIDTH_PX - LABEL_WIDTH_PX) / (labels as i32 - 1);
    if spacing < room {
        spacing
    } else {
        room
    }
}

pub struct BatteryStatusWidget<L, const N: usize> {
    peripherals: [L; N],
    central: Option<L>,
    config: WidgetConfig,
}

impl<L: Label, const N: usize> BatteryStatusWidget<L, N> {
    /// Create the labels for every slot, all blank.
    pub fn new<F>(factory: &mut F, config: WidgetConfig) -> Self
    where
        F: LabelFactory<Label = L>,
    {
        let labels = N + usize::from(config.show_central);
        let spacing = fitted_spacing(labels, config.label_spacing);
        let peripherals = core::array::from_fn(|index| {
            let mut label = factory.create(slot_offset(index, N, spacing));
            label.show(LabelContent::Blank);
            label
        });
        let central = config.show_central.then(|| {
            let mut label = factory.create(N as i32 * spacing);
            label.show(LabelContent::Blank);
            label
        });

        Self {
            peripherals,
            central,
            config,
        }
    }

    /// Push the current state into every label.
    pub fn render(&mut self, status: &BatteryStatus<N>) {
        let mode = self.config.display_mode;
        for (index, slot) in status.peripherals.display_order() {
            let content = if slot.active {
                label_content(slot.level, mode)
            } else {
                LabelContent::Blank
            };
            self.peripherals[index].show(content);
        }

        if let Some(label) = self.central.as_mut() {
            let content = match (status.usb_present, status.central) {
                (true, _) => LabelContent::Charging,
                (false, Some(level)) => label_content(level, mode),
                (false, None) => LabelContent::Blank,
            };
            label.show(content);
        }
    }

    pub fn peripheral_label(&self, index: usize) -> Option<&L> {
        self.peripherals.get(index)
    }

    pub fn central_label(&self) -> Option<&L> {
        self.central.as_ref()
    }

    /// All labels in on-screen order, left to right.
    pub fn labels(&self) -> impl Iterator<Item = &L> {
        self.peripherals.iter().rev().chain(self.central.iter())
    }
}

/// Handle returned by `WidgetRegistry::attach`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WidgetId(u8);

/// Shared battery state plus every widget listening to it.
pub struct WidgetRegistry<L, const N: usize, const W: usize> {
    status: BatteryStatus<N>,
    config: WidgetConfig,
    widgets: Vec<(WidgetId, BatteryStatusWidget<L, N>), W>,
    next_id: u8,
}

impl<L: Label, const N: usize, const W: usize> WidgetRegistry<L, N, W> {
    pub const fn new(config: WidgetConfig) -> Self {
        Self {
            status: BatteryStatus::new(),
            config,
            widgets: Vec::new(),
            next_id: 0,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn status(&self) -> &BatteryStatus<N> {
        &self.status
    }

    /// Register a widget; it is drawn with the current state right away.
    pub fn attach(&mut self, mut widget: BatteryStatusWidget<L, N>) -> Result<WidgetId, Error> {
        if self.widgets.is_full() {
            return Err(Error::WidgetLimit);
        }
        let id = WidgetId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        widget.render(&self.status);
        self.widgets
            .push((id, widget))
            .map_err(|_| Error::WidgetLimit)?;
        Ok(id)
    }

    /// Unregister a widget and hand it back; dropping it releases its labels.
    pub fn detach(&mut self, id: WidgetId) -> Result<BatteryStatusWidget<L, N>, Error> {
        let position = self
            .widgets
            .iter()
            .position(|(wid, _)| *wid == id)
            .ok_or(Error::UnknownWidget)?;
        Ok(self.widgets.remove(position).1)
    }

    pub fn widget(&self, id: WidgetId) -> Option<&BatteryStatusWidget<L, N>> {
        self.widgets
            .iter()
            .find(|(wid, _)| *wid == id)
            .map(|(_, w)| w)
    }

    pub fn widgets(&self) -> impl Iterator<Item = &BatteryStatusWidget<L, N>> {
        self.widgets.iter().map(|(_, w)| w)
    }

    /// Event-driven refresh: apply `event` and redraw every widget.
    ///
    /// Widgets are redrawn even when the reading was rejected for its slot,
    /// but not for event kinds the configuration disables.
    pub fn handle_event(&mut self, event: BatteryEvent) -> Result<bool, Error> {
        let result = self.status.apply(event, &self.config);
        match result {
            Err(Error::NotSupported) => {}
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("battery event {} rejected: {}", event, _e);
                self.render_all();
            }
            Ok(_) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("battery event {}", event);
                self.render_all();
            }
        }
        result
    }

    /// Polling refresh: re-read `source`, redraw only when something changed.
    pub fn tick<S: BatteryLevelSource>(&mut self, source: &S) -> bool {
        let changed = self.status.poll(source, &self.config);
        if changed {
            self.render_all();
        }
        changed
    }

    fn render_all(&mut self) {
        for (_, widget) in self.widgets.iter_mut() {
            widget.render(&self.status);
        }
    }
}
