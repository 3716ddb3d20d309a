use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, mutex::Mutex, pipe::Pipe,
    signal::Signal,
};

use super::{power::PowerSignal, CommandRunner, RawAtCommand};
use crate::{
    at_command::{registration::Registration, DnsEvent, ResponseCode},
    drop::DropChannel,
    sockets::SocketTable,
    util::{RingChannel, StateSignal},
};

/// Shared state between the modem handle, the sockets and the pump tasks.
/// Statically allocated by the host.
pub struct ModemContext {
    pub(crate) power_signal: PowerSignal,
    pub(crate) baud: StateSignal<CriticalSectionRawMutex, u32>,
    pub(crate) command_lock: Mutex<CriticalSectionRawMutex, ()>,
    pub(crate) commands: Channel<CriticalSectionRawMutex, RawAtCommand, 4>,
    pub(crate) generic_response: Channel<CriticalSectionRawMutex, ResponseCode, 1>,
    pub(crate) drop_channel: DropChannel,
    pub(crate) sockets: SocketTable,
    pub(crate) registration: StateSignal<CriticalSectionRawMutex, Registration>,
    pub(crate) dns_lock: Mutex<CriticalSectionRawMutex, ()>,
    pub(crate) dns_events: RingChannel<CriticalSectionRawMutex, DnsEvent, 8>,
    pub(crate) psm_timer: Signal<CriticalSectionRawMutex, ()>,
    pub(crate) powered_down: Signal<CriticalSectionRawMutex, ()>,
    pub(crate) tx_pipe: Pipe<CriticalSectionRawMutex, 2048>,
    pub(crate) rx_pipe: Pipe<CriticalSectionRawMutex, 2048>,
    pub(crate) closed: AtomicBool,
}

impl ModemContext {
    pub const fn new() -> Self {
        ModemContext {
            power_signal: PowerSignal::new(),
            baud: StateSignal::new(115_200),
            command_lock: Mutex::new(()),
            commands: Channel::new(),
            generic_response: Channel::new(),
            drop_channel: DropChannel::new(),
            sockets: SocketTable::new(),
            registration: StateSignal::new(Registration::NONE),
            dns_lock: Mutex::new(()),
            dns_events: RingChannel::new(),
            psm_timer: Signal::new(),
            powered_down: Signal::new(),
            tx_pipe: Pipe::new(),
            rx_pipe: Pipe::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn commands(&self) -> CommandRunner<'_> {
        CommandRunner::create(self)
    }

    /// Tear the session down. Subsequent attempts to issue commands fail
    /// with [Closed](crate::Error::Closed). Used on final teardown and when
    /// a mid-payload fault leaves the modem in an unknown state.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for ModemContext {
    fn default() -> Self {
        Self::new()
    }
}
