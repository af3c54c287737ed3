//! Peripheral link slots.
//!
//! Maps BLE peripheral addresses to the slot index their battery readings
//! are reported under. A peripheral that drops and reconnects gets its old
//! slot back as long as nobody else claimed it meanwhile, so its label does
//! not jump around on screen.

use heapless::String;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSlot<A> {
    /// Last peripheral seen on this slot (kept after disconnect).
    pub address: Option<A>,
    pub name: String<32>,
    pub connected: bool,
}

impl<A> LinkSlot<A> {
    pub const fn empty() -> Self {
        Self {
            address: None,
            name: String::new(),
            connected: false,
        }
    }
}

pub struct LinkSlots<A, const N: usize> {
    slots: [LinkSlot<A>; N],
}

impl<A: Clone + PartialEq, const N: usize> Default for LinkSlots<A, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone + PartialEq, const N: usize> LinkSlots<A, N> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| LinkSlot::empty()),
        }
    }

    pub fn slot(&self, index: usize) -> Option<&LinkSlot<A>> {
        self.slots.get(index)
    }

    /// Slot currently connected to `address`.
    pub fn slot_of(&self, address: &A) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.connected && s.address.as_ref() == Some(address))
    }

    pub fn is_connected(&self, address: &A) -> bool {
        self.slot_of(address).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.connected).count()
    }

    pub fn has_free_slot(&self) -> bool {
        self.active_count() < N
    }

    /// Slot a new connection to `address` should use: its previous slot if
    /// still free, else the first slot never used, else any free slot.
    pub fn reserve(&self, address: &A) -> Option<usize> {
        if let Some(i) = self.slot_of(address) {
            return Some(i);
        }
        self.slots
            .iter()
            .position(|s| !s.connected && s.address.as_ref() == Some(address))
            .or_else(|| {
                self.slots
                    .iter()
                    .position(|s| !s.connected && s.address.is_none())
            })
            .or_else(|| self.slots.iter().position(|s| !s.connected))
    }

    pub fn connect(&mut self, index: usize, address: A, name: &str) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.address = Some(address);
            slot.name.clear();
            for c in name.chars() {
                if slot.name.push(c).is_err() {
                    break;
                }
            }
            slot.connected = true;
        }
    }

    /// Mark `index` disconnected; the address is remembered for reconnects.
    pub fn disconnect(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.connected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Addr = [u8; 6];
    const LEFT: Addr = [1, 0, 0, 0, 0, 0];
    const RIGHT: Addr = [2, 0, 0, 0, 0, 0];
    const OTHER: Addr = [3, 0, 0, 0, 0, 0];

    #[test]
    fn new_peripherals_take_first_empty_slot() {
        let mut slots: LinkSlots<Addr, 2> = LinkSlots::new();
        assert_eq!(slots.reserve(&LEFT), Some(0));
        slots.connect(0, LEFT, "left");
        assert_eq!(slots.reserve(&RIGHT), Some(1));
        slots.connect(1, RIGHT, "right");
        assert_eq!(slots.reserve(&OTHER), None);
        assert!(!slots.has_free_slot());
        assert_eq!(slots.slot_of(&RIGHT), Some(1));
    }

    #[test]
    fn reconnect_returns_to_previous_slot() {
        let mut slots: LinkSlots<Addr, 2> = LinkSlots::new();
        slots.connect(0, LEFT, "left");
        slots.connect(1, RIGHT, "right");
        slots.disconnect(0);
        slots.disconnect(1);
        assert_eq!(slots.active_count(), 0);
        assert_eq!(slots.reserve(&RIGHT), Some(1));
        assert_eq!(slots.reserve(&LEFT), Some(0));
        assert!(!slots.is_connected(&LEFT));
    }

    #[test]
    fn stranger_reuses_a_stale_slot() {
        let mut slots: LinkSlots<Addr, 2> = LinkSlots::new();
        slots.connect(0, LEFT, "left");
        slots.connect(1, RIGHT, "right");
        slots.disconnect(1);
        assert_eq!(slots.reserve(&OTHER), Some(1));
    }

    #[test]
    fn long_names_are_truncated() {
        let mut slots: LinkSlots<Addr, 1> = LinkSlots::new();
        slots.connect(0, LEFT, "a-very-long-peripheral-name-that-overflows");
        assert_eq!(slots.slot(0).unwrap().name.len(), 32);
    }
}
