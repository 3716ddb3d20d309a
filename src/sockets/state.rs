use core::{cell::RefCell, future::Future, task::Poll};

use embassy_sync::{
    blocking_mutex,
    blocking_mutex::raw::CriticalSectionRawMutex,
    waitqueue::WakerRegistration,
};

pub const CONNECTED: u8 = 1 << 0;
pub const READABLE: u8 = 1 << 1;
pub const CLOSED: u8 = 1 << 2;

/// Per-socket state word driven by URCs from the reader task.
///
/// A reader that saw zero bytes wants to clear READABLE, but a `recv` URC
/// may land between its read command and the clear. The `dirty` flag keeps
/// that edge: URC-driven `set` turns it on, `clear` refuses while it is on,
/// and only a fresh `wait_any` resets it.
pub struct SocketState {
    inner: blocking_mutex::Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
}

struct Inner {
    bits: u8,
    dirty: bool,
    error: u16,
    pdp_deact: bool,
    wire_id: u8,
    waker: WakerRegistration,
}

impl SocketState {
    /// Wire ids are small; 0xff marks a slot not yet bound to one.
    pub const WIRE_NONE: u8 = 0xff;

    pub const fn new() -> Self {
        SocketState {
            inner: blocking_mutex::Mutex::new(RefCell::new(Inner {
                bits: 0,
                dirty: false,
                error: 0,
                pdp_deact: false,
                wire_id: Self::WIRE_NONE,
                waker: WakerRegistration::new(),
            })),
        }
    }

    /// Set bits in the state word and mark the edge dirty.
    pub fn set(&self, bits: u8) {
        self.inner.lock(|s| {
            let mut s = s.borrow_mut();
            s.bits |= bits;
            s.dirty = true;
            s.waker.wake();
        })
    }

    /// Clear bits, unless a `set` raced in since the last `wait_any`.
    pub fn clear(&self, bits: u8) {
        self.inner.lock(|s| {
            let mut s = s.borrow_mut();
            if !s.dirty {
                s.bits &= !bits;
            }
        })
    }

    /// Wait until any of `mask` is set. Resets the dirty flag at the start
    /// of the wait, so an edge delivered after this point survives the next
    /// `clear`.
    pub fn wait_any(&self, mask: u8) -> impl Future<Output = u8> + '_ {
        let mut fresh = true;
        core::future::poll_fn(move |cx| {
            self.inner.lock(|s| {
                let mut s = s.borrow_mut();
                if fresh {
                    s.dirty = false;
                    fresh = false;
                }
                if s.bits & mask != 0 {
                    Poll::Ready(s.bits)
                } else {
                    s.waker.register(cx.waker());
                    Poll::Pending
                }
            })
        })
    }

    pub fn is(&self, bits: u8) -> bool {
        self.inner.lock(|s| s.borrow().bits & bits != 0)
    }

    pub fn set_error(&self, code: u16) {
        self.inner.lock(|s| s.borrow_mut().error = code)
    }

    pub fn error(&self) -> u16 {
        self.inner.lock(|s| s.borrow().error)
    }

    pub fn mark_pdp_deact(&self) {
        self.inner.lock(|s| s.borrow_mut().pdp_deact = true)
    }

    pub fn pdp_deact(&self) -> bool {
        self.inner.lock(|s| s.borrow().pdp_deact)
    }

    pub fn set_wire_id(&self, id: u8) {
        self.inner.lock(|s| s.borrow_mut().wire_id = id)
    }

    pub fn wire_id(&self) -> u8 {
        self.inner.lock(|s| s.borrow().wire_id)
    }

    /// Forget everything; run when the slot goes back in the pool.
    pub fn reset(&self) {
        self.inner.lock(|s| {
            let mut s = s.borrow_mut();
            s.bits = 0;
            s.dirty = false;
            s.error = 0;
            s.pdp_deact = false;
            s.wire_id = Self::WIRE_NONE;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn set_then_wait() {
        let state = SocketState::new();
        state.set(READABLE);
        assert_eq!(block_on(state.wait_any(READABLE)) & READABLE, READABLE);
    }

    #[test]
    fn clear_drops_bit_without_race() {
        let state = SocketState::new();
        state.set(READABLE);
        block_on(state.wait_any(READABLE));
        state.clear(READABLE);
        assert!(!state.is(READABLE));
    }

    #[test]
    fn racing_set_survives_clear() {
        let state = SocketState::new();
        state.set(READABLE);
        block_on(state.wait_any(READABLE));

        // A recv URC lands after the wait returned but before the reader
        // decides the buffer drained and clears.
        state.set(READABLE);
        state.clear(READABLE);

        // The edge survived: the next wait returns without blocking.
        assert!(state.is(READABLE));
        assert_eq!(block_on(state.wait_any(READABLE)) & READABLE, READABLE);
    }

    #[test]
    fn closed_is_sticky_alongside_other_bits() {
        let state = SocketState::new();
        state.set(CONNECTED);
        state.set(CLOSED);
        let bits = block_on(state.wait_any(CLOSED));
        assert_ne!(bits & CLOSED, 0);
        assert_ne!(bits & CONNECTED, 0);
    }

    #[test]
    fn reset_clears_flags() {
        let state = SocketState::new();
        state.set(CLOSED);
        state.set_error(566);
        state.mark_pdp_deact();
        state.set_wire_id(3);
        state.reset();
        assert!(!state.is(CLOSED));
        assert_eq!(state.error(), 0);
        assert!(!state.pdp_deact());
        assert_eq!(state.wire_id(), SocketState::WIRE_NONE);
    }
}
