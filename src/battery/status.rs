//! Shared battery state and the events that mutate it.

use crate::battery::table::{BatteryTable, SlotPolicy};
use crate::config::WidgetConfig;
use crate::error::Error;

/// Battery-related notifications delivered to the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryEvent {
    /// A peripheral reported its level. `index` is the link slot the
    /// reading arrived on, when the source knows it.
    Peripheral { index: Option<u8>, level: u8 },
    /// The link to a peripheral was lost.
    PeripheralDisconnected { index: u8 },
    /// The central measured its own supply.
    Central { level: u8 },
    /// USB power appeared or went away on the central.
    UsbPower { present: bool },
}

/// Anything the polling refresh can read levels from.
pub trait BatteryLevelSource {
    /// Level of peripheral `index`, `None` while it is not connected.
    fn peripheral_level(&self, index: usize) -> Option<u8>;
    fn central_level(&self) -> Option<u8>;
    fn usb_present(&self) -> bool;
}

/// Everything the battery labels are drawn from.
///
/// `links` remembers which table slot each BLE link last wrote to. Under
/// `Indexed` the two are the same; the other policies pick slots by
/// level or vacancy, so repeat readings and disconnects go through it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatteryStatus<const N: usize> {
    pub peripherals: BatteryTable<N>,
    pub central: Option<u8>,
    pub usb_present: bool,
    links: [Option<usize>; N],
}

impl<const N: usize> Default for BatteryStatus<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BatteryStatus<N> {
    pub const fn new() -> Self {
        Self {
            peripherals: BatteryTable::new(),
            central: None,
            usb_present: false,
            links: [None; N],
        }
    }

    /// Table slot currently showing link `link`'s reading.
    pub fn slot_of_link(&self, link: usize) -> Option<usize> {
        self.links.get(link).copied().flatten()
    }

    /// Apply one event. Returns whether anything visible changed.
    ///
    /// Central and USB events are rejected with `Error::NotSupported`
    /// while the central label is disabled.
    pub fn apply(&mut self, event: BatteryEvent, config: &WidgetConfig) -> Result<bool, Error> {
        match event {
            BatteryEvent::Peripheral { index, level } => {
                self.record_peripheral(index.map(usize::from), level, config)
            }
            BatteryEvent::PeripheralDisconnected { index } => {
                self.disconnect(usize::from(index), config)
            }
            BatteryEvent::Central { level } => {
                if !config.show_central {
                    return Err(Error::NotSupported);
                }
                let level = Some(level.min(100));
                let changed = self.central != level;
                self.central = level;
                Ok(changed)
            }
            BatteryEvent::UsbPower { present } => {
                if !config.show_central {
                    return Err(Error::NotSupported);
                }
                let changed = self.usb_present != present;
                self.usb_present = present;
                Ok(changed)
            }
        }
    }

    /// Refresh every reading from `source`, placing them under the
    /// configured slot policy. Returns whether anything changed.
    pub fn poll<S: BatteryLevelSource>(&mut self, source: &S, config: &WidgetConfig) -> bool {
        let mut changed = false;
        for link in 0..N {
            // Links are always in range here and every policy has a slot
            // for a link it already knows.
            let result = match source.peripheral_level(link) {
                Some(level) => self.record_peripheral(Some(link), level, config),
                None => self.disconnect(link, config),
            };
            changed |= result.unwrap_or(false);
        }

        if config.show_central {
            let central = source.central_level().map(|l| l.min(100));
            let usb = source.usb_present();
            changed |= self.central != central || self.usb_present != usb;
            self.central = central;
            self.usb_present = usb;
        }
        changed
    }

    fn record_peripheral(
        &mut self,
        link: Option<usize>,
        level: u8,
        config: &WidgetConfig,
    ) -> Result<bool, Error> {
        if let Some(index) = link.filter(|&l| l >= N) {
            return Err(Error::SlotOutOfRange { index });
        }

        let policy = config.slot_policy;
        let known = link.and_then(|l| self.slot_of_link(l));
        let slot = match (policy, known) {
            (SlotPolicy::Indexed, _) => self.peripherals.assign(policy, link, level, 0)?,
            (_, Some(slot)) => slot,
            (_, None) => {
                let chosen = self
                    .peripherals
                    .assign(policy, None, level, config.nearest_tolerance)?;
                // A new link never takes over another link's slot while a
                // free one is left.
                match (link, self.links.contains(&Some(chosen))) {
                    (Some(_), true) => self.peripherals.first_empty().unwrap_or(chosen),
                    _ => chosen,
                }
            }
        };
        let changed = self.peripherals.set(slot, level)?;

        if let Some(link) = link {
            // A slot shows one link at a time.
            for owner in self.links.iter_mut().filter(|o| **o == Some(slot)) {
                *owner = None;
            }
            self.links[link] = Some(slot);
        }
        Ok(changed)
    }

    fn disconnect(&mut self, link: usize, config: &WidgetConfig) -> Result<bool, Error> {
        let owned = self
            .links
            .get_mut(link)
            .ok_or(Error::SlotOutOfRange { index: link })?
            .take();
        match (config.slot_policy, owned) {
            (SlotPolicy::Indexed, _) => self.peripherals.clear(link),
            (_, Some(slot)) => self.peripherals.clear(slot),
            (_, None) => Ok(false),
        }
    }
}

/// Latest reading per source, fed by events and read back by the polling
/// refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatestLevels<const N: usize> {
    peripherals: [Option<u8>; N],
    central: Option<u8>,
    usb_present: bool,
}

impl<const N: usize> Default for LatestLevels<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LatestLevels<N> {
    pub const fn new() -> Self {
        Self {
            peripherals: [None; N],
            central: None,
            usb_present: false,
        }
    }

    /// Record an event. Peripheral readings without an index cannot be
    /// attributed to a link and are dropped.
    pub fn record(&mut self, event: BatteryEvent) -> Result<(), Error> {
        match event {
            BatteryEvent::Peripheral { index, level } => {
                let index = usize::from(index.ok_or(Error::NotSupported)?);
                let slot = self
                    .peripherals
                    .get_mut(index)
                    .ok_or(Error::SlotOutOfRange { index })?;
                *slot = Some(level.min(100));
            }
            BatteryEvent::PeripheralDisconnected { index } => {
                let index = usize::from(index);
                let slot = self
                    .peripherals
                    .get_mut(index)
                    .ok_or(Error::SlotOutOfRange { index })?;
                *slot = None;
            }
            BatteryEvent::Central { level } => self.central = Some(level.min(100)),
            BatteryEvent::UsbPower { present } => self.usb_present = present,
        }
        Ok(())
    }
}

impl<const N: usize> BatteryLevelSource for LatestLevels<N> {
    fn peripheral_level(&self, index: usize) -> Option<u8> {
        self.peripherals.get(index).copied().flatten()
    }

    fn central_level(&self) -> Option<u8> {
        self.central
    }

    fn usb_present(&self) -> bool {
        self.usb_present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(show_central: bool) -> WidgetConfig {
        WidgetConfig {
            show_central,
            slot_policy: SlotPolicy::Indexed,
            ..WidgetConfig::from_build_config()
        }
    }

    fn policy(slot_policy: SlotPolicy) -> WidgetConfig {
        WidgetConfig {
            slot_policy,
            nearest_tolerance: 10,
            ..config(false)
        }
    }

    fn reading(link: u8, level: u8) -> BatteryEvent {
        BatteryEvent::Peripheral {
            index: Some(link),
            level,
        }
    }

    fn levels<const N: usize>(status: &BatteryStatus<N>) -> [(bool, u8); N] {
        core::array::from_fn(|i| {
            let slot = status.peripherals.get(i).unwrap();
            (slot.active, slot.level)
        })
    }

    #[test]
    fn peripheral_event_updates_indexed_slot() {
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        let changed = status
            .apply(
                BatteryEvent::Peripheral {
                    index: Some(1),
                    level: 64,
                },
                &config(false),
            )
            .unwrap();
        assert!(changed);
        assert!(status.peripherals.is_active(1));
        assert!(!status.peripherals.is_active(0));
    }

    #[test]
    fn disconnect_clears_slot() {
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        let cfg = config(false);
        status
            .apply(BatteryEvent::Peripheral { index: Some(0), level: 10 }, &cfg)
            .unwrap();
        assert_eq!(
            status.apply(BatteryEvent::PeripheralDisconnected { index: 0 }, &cfg),
            Ok(true)
        );
        assert_eq!(status.peripherals.active_count(), 0);
    }

    #[test]
    fn central_events_need_central_label() {
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        assert_eq!(
            status.apply(BatteryEvent::Central { level: 50 }, &config(false)),
            Err(Error::NotSupported)
        );
        assert_eq!(
            status.apply(BatteryEvent::UsbPower { present: true }, &config(false)),
            Err(Error::NotSupported)
        );
        assert_eq!(status.central, None);

        assert_eq!(
            status.apply(BatteryEvent::Central { level: 50 }, &config(true)),
            Ok(true)
        );
        assert_eq!(
            status.apply(BatteryEvent::UsbPower { present: true }, &config(true)),
            Ok(true)
        );
        assert_eq!(status.central, Some(50));
        assert!(status.usb_present);
    }

    #[test]
    fn poll_reads_source_and_reports_change() {
        let mut levels: LatestLevels<2> = LatestLevels::new();
        levels
            .record(BatteryEvent::Peripheral { index: Some(0), level: 70 })
            .unwrap();
        levels.record(BatteryEvent::Central { level: 90 }).unwrap();

        let mut status: BatteryStatus<2> = BatteryStatus::new();
        assert!(status.poll(&levels, &config(true)));
        assert!(!status.poll(&levels, &config(true)));
        assert_eq!(status.peripherals.get(0).unwrap().level, 70);
        assert_eq!(status.central, Some(90));

        levels
            .record(BatteryEvent::PeripheralDisconnected { index: 0 })
            .unwrap();
        assert!(status.poll(&levels, &config(true)));
        assert!(!status.peripherals.is_active(0));
    }

    #[test]
    fn latest_levels_rejects_unattributed_readings() {
        let mut levels: LatestLevels<2> = LatestLevels::new();
        assert_eq!(
            levels.record(BatteryEvent::Peripheral { index: None, level: 5 }),
            Err(Error::NotSupported)
        );
        assert_eq!(
            levels.record(BatteryEvent::Peripheral { index: Some(3), level: 5 }),
            Err(Error::SlotOutOfRange { index: 3 })
        );
    }

    #[test]
    fn first_empty_repeat_reading_keeps_its_slot() {
        let cfg = policy(SlotPolicy::FirstEmpty);
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        assert_eq!(status.apply(reading(1, 70), &cfg), Ok(true));
        assert_eq!(status.apply(reading(1, 68), &cfg), Ok(true));
        assert_eq!(status.peripherals.active_count(), 1);
        assert_eq!(status.slot_of_link(1), Some(0));
        assert_eq!(levels(&status), [(true, 68), (false, 0)]);
    }

    #[test]
    fn first_empty_disconnect_clears_only_that_link() {
        let cfg = policy(SlotPolicy::FirstEmpty);
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        status.apply(reading(1, 70), &cfg).unwrap();

        // Link 0 never reported, nothing to clear.
        assert_eq!(
            status.apply(BatteryEvent::PeripheralDisconnected { index: 0 }, &cfg),
            Ok(false)
        );
        assert_eq!(levels(&status), [(true, 70), (false, 0)]);

        status.apply(reading(0, 40), &cfg).unwrap();
        assert_eq!(levels(&status), [(true, 70), (true, 40)]);

        assert_eq!(
            status.apply(BatteryEvent::PeripheralDisconnected { index: 1 }, &cfg),
            Ok(true)
        );
        assert_eq!(levels(&status), [(false, 0), (true, 40)]);
        assert_eq!(status.slot_of_link(1), None);

        // The freed slot goes to the next newcomer.
        status.apply(reading(1, 90), &cfg).unwrap();
        assert_eq!(status.slot_of_link(1), Some(0));
    }

    #[test]
    fn nearest_level_disconnect_follows_the_link() {
        let cfg = policy(SlotPolicy::NearestLevel);
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        status.apply(reading(1, 80), &cfg).unwrap();
        status.apply(reading(0, 30), &cfg).unwrap();
        assert_eq!(levels(&status), [(true, 80), (true, 30)]);

        status
            .apply(BatteryEvent::PeripheralDisconnected { index: 1 }, &cfg)
            .unwrap();
        assert_eq!(levels(&status), [(false, 0), (true, 30)]);
    }

    #[test]
    fn nearest_level_known_link_keeps_slot_across_large_drop() {
        let cfg = policy(SlotPolicy::NearestLevel);
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        status.apply(reading(0, 80), &cfg).unwrap();
        status.apply(reading(1, 30), &cfg).unwrap();
        // 35 is nearer slot 1, but link 0 already owns slot 0.
        status.apply(reading(0, 35), &cfg).unwrap();
        assert_eq!(levels(&status), [(true, 35), (true, 30)]);
    }

    #[test]
    fn nearest_level_new_link_with_similar_level_gets_own_slot() {
        let cfg = policy(SlotPolicy::NearestLevel);
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        status.apply(reading(0, 50), &cfg).unwrap();
        status.apply(reading(1, 55), &cfg).unwrap();
        assert_eq!(levels(&status), [(true, 50), (true, 55)]);
        assert_eq!(status.slot_of_link(0), Some(0));
        assert_eq!(status.slot_of_link(1), Some(1));

        let mut source: LatestLevels<2> = LatestLevels::new();
        source.record(reading(0, 50)).unwrap();
        source.record(reading(1, 55)).unwrap();
        assert!(!status.poll(&source, &cfg));
    }

    #[test]
    fn nearest_level_tie_goes_to_lowest_slot() {
        let cfg = policy(SlotPolicy::NearestLevel);
        let mut status: BatteryStatus<2> = BatteryStatus::new();
        let anonymous = |level| BatteryEvent::Peripheral { index: None, level };
        status.apply(anonymous(40), &cfg).unwrap();
        status.apply(anonymous(60), &cfg).unwrap();
        status.apply(anonymous(50), &cfg).unwrap();
        assert_eq!(levels(&status), [(true, 50), (true, 60)]);
    }

    #[test]
    fn link_beyond_table_is_rejected_under_every_policy() {
        for slot_policy in [
            SlotPolicy::Indexed,
            SlotPolicy::FirstEmpty,
            SlotPolicy::NearestLevel,
        ] {
            let mut status: BatteryStatus<2> = BatteryStatus::new();
            assert_eq!(
                status.apply(reading(2, 50), &policy(slot_policy)),
                Err(Error::SlotOutOfRange { index: 2 })
            );
            assert_eq!(status.peripherals.active_count(), 0);
        }
    }

    #[test]
    fn poll_places_readings_by_slot_policy() {
        let cfg = policy(SlotPolicy::FirstEmpty);
        let mut source: LatestLevels<2> = LatestLevels::new();
        source.record(reading(1, 55)).unwrap();

        let mut status: BatteryStatus<2> = BatteryStatus::new();
        assert!(status.poll(&source, &cfg));
        assert_eq!(levels(&status), [(true, 55), (false, 0)]);

        // Unchanged source: one label, no change.
        assert!(!status.poll(&source, &cfg));
        assert_eq!(status.peripherals.active_count(), 1);

        source
            .record(BatteryEvent::PeripheralDisconnected { index: 1 })
            .unwrap();
        assert!(status.poll(&source, &cfg));
        assert_eq!(status.peripherals.active_count(), 0);
    }
}
