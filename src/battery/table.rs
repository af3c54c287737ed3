//! Fixed-size table of per-peripheral battery readings.
//!
//! Each slot backs one on-screen label. A slot is *active* once a reading
//! has been stored and stays active until the peripheral disconnects.

use crate::error::Error;

/// How an incoming peripheral reading picks its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotPolicy {
    /// The reading's peripheral index is the slot.
    Indexed,
    /// Match the active slot with the closest stored level; readings far
    /// from every known level open a new slot.
    NearestLevel,
    /// Known sources keep their slot, new ones take the first empty slot.
    FirstEmpty,
}

/// One battery reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot {
    pub level: u8,
    pub active: bool,
}

impl Slot {
    pub const EMPTY: Slot = Slot {
        level: 0,
        active: false,
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatteryTable<const N: usize> {
    slots: [Slot; N],
}

impl<const N: usize> Default for BatteryTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BatteryTable<N> {
    pub const fn new() -> Self {
        Self {
            slots: [Slot::EMPTY; N],
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.active)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Slot indices in on-screen order: highest index first (leftmost).
    pub fn display_order(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots.iter().enumerate().rev()
    }

    /// Store `level` at `index` and mark the slot active.
    ///
    /// Returns whether the slot changed. Out-of-range indices leave the
    /// table untouched.
    pub fn set(&mut self, index: usize, level: u8) -> Result<bool, Error> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::SlotOutOfRange { index })?;
        let updated = Slot {
            level: level.min(100),
            active: true,
        };
        let changed = *slot != updated;
        *slot = updated;
        Ok(changed)
    }

    /// Forget the reading at `index`.
    pub fn clear(&mut self, index: usize) -> Result<bool, Error> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::SlotOutOfRange { index })?;
        let changed = *slot != Slot::EMPTY;
        *slot = Slot::EMPTY;
        Ok(changed)
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(|s| !s.active)
    }

    /// Active slot whose level is closest to `level`, with its distance.
    /// Ties go to the lowest index.
    pub fn nearest(&self, level: u8) -> Option<(usize, u8)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (i, s.level.abs_diff(level.min(100))))
            .min_by_key(|&(i, distance)| (distance, i))
    }

    /// Pick the slot a reading belongs to under `policy`.
    ///
    /// `hint` is the peripheral index carried by the event, if any.
    pub fn assign(
        &self,
        policy: SlotPolicy,
        hint: Option<usize>,
        level: u8,
        tolerance: u8,
    ) -> Result<usize, Error> {
        match policy {
            SlotPolicy::Indexed => {
                let index = hint.ok_or(Error::NotSupported)?;
                if index >= N {
                    return Err(Error::SlotOutOfRange { index });
                }
                Ok(index)
            }
            SlotPolicy::FirstEmpty => match hint.filter(|&i| self.is_active(i)) {
                Some(known) => Ok(known),
                None => self.first_empty().ok_or(Error::NoFreeSlot),
            },
            SlotPolicy::NearestLevel => match (self.nearest(level), self.first_empty()) {
                (Some((index, distance)), _) if distance <= tolerance => Ok(index),
                (_, Some(empty)) => Ok(empty),
                (Some((index, _)), None) => Ok(index),
                (None, None) => Err(Error::NoFreeSlot),
            },
        }
    }

    /// Assign a slot under `policy` and store the reading there.
    ///
    /// Returns the chosen slot and whether it changed.
    pub fn record(
        &mut self,
        policy: SlotPolicy,
        hint: Option<usize>,
        level: u8,
        tolerance: u8,
    ) -> Result<(usize, bool), Error> {
        let index = self.assign(policy, hint, level, tolerance)?;
        let changed = self.set(index, level)?;
        Ok((index, changed))
    }
}
