pub mod state;
pub mod tcp;
pub mod udp;

pub use state::{SocketState, CLOSED, CONNECTED, READABLE};
pub use tcp::TcpSocket;
pub use udp::UdpSocket;

use crate::slot::Slot;

/// Upper bound across the supported chips; each vendor uses the first
/// `SOCKET_COUNT` slots of its table.
pub const MAX_SOCKETS: usize = 12;

/// The socket multiplexer map: slot index in, state out. Slots are claimed
/// lowest-free-first, and a released index is handed out again.
pub struct SocketTable {
    slots: [Slot<SocketState>; MAX_SOCKETS],
}

impl SocketTable {
    pub const fn new() -> Self {
        const SLOT: Slot<SocketState> = Slot::new(SocketState::new());
        SocketTable { slots: [SLOT; MAX_SOCKETS] }
    }

    /// Claim the lowest free slot among the first `count`.
    pub fn claim(&self, count: usize) -> Option<(usize, &SocketState)> {
        self.slots[..count.min(MAX_SOCKETS)]
            .iter()
            .enumerate()
            .find_map(|(i, slot)| {
                let state = slot.claim()?;
                state.reset();
                Some((i, state))
            })
    }

    pub fn release(&self, index: usize) {
        self.slots[index].peek().reset();
        self.slots[index].release();
    }

    pub fn state(&self, index: usize) -> &SocketState {
        self.slots[index].peek()
    }

    /// Find the claimed slot carrying this vendor wire id.
    pub fn by_wire_id(&self, id: u8) -> Option<&SocketState> {
        self.slots
            .iter()
            .filter(|slot| slot.is_claimed())
            .map(|slot| slot.peek())
            .find(|state| state.wire_id() == id)
    }

    /// Mark every claimed socket closed; used for teardown and PDP loss.
    pub fn close_all(&self, pdp_deact: bool) {
        for slot in self.slots.iter().filter(|slot| slot.is_claimed()) {
            let state = slot.peek();
            if pdp_deact {
                state.mark_pdp_deact();
            }
            state.set(CLOSED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_lowest_free_and_reuses_released_ids() {
        let table = SocketTable::new();
        let count = 6;

        let mut claimed = heapless::Vec::<usize, MAX_SOCKETS>::new();
        while let Some((i, state)) = table.claim(count) {
            state.set_wire_id(i as u8 + 1);
            claimed.push(i).unwrap();
        }
        assert_eq!(claimed.as_slice(), &[0, 1, 2, 3, 4, 5]);

        // The range is full.
        assert!(table.claim(count).is_none());

        // Closing id 0 and opening again yields id 0.
        table.release(0);
        let (i, _) = table.claim(count).unwrap();
        assert_eq!(i, 0);
    }

    #[test]
    fn wire_id_lookup_skips_unclaimed() {
        let table = SocketTable::new();
        let (i, state) = table.claim(6).unwrap();
        state.set_wire_id(5);
        assert!(table.by_wire_id(5).is_some());
        table.release(i);
        assert!(table.by_wire_id(5).is_none());
    }
}
