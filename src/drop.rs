//! Types for facilitating asynchronous dropping.
//!
//! Closing a socket needs AT traffic, which the regular Drop trait cannot
//! await. [AsyncDrop] posts a [DropMessage] to the [DropChannel] when it is
//! dropped; a dedicated task (the [DropPump](crate::pump::DropPump)) runs
//! the actual close and releases the slot. This is also what makes socket
//! removal from the table happen exactly once.

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

use crate::log;
use crate::modem::{CommandRunnerGuard, ModemContext};
use crate::sockets::MAX_SOCKETS;
use crate::vendor::Vendor;
use crate::Error;

/// Must hold one message per object that can be dropped concurrently.
const DROP_CAPACITY: usize = MAX_SOCKETS;
pub type DropChannel = Channel<CriticalSectionRawMutex, DropMessage, DROP_CAPACITY>;

/// Posts its message on drop. Embed it in any type whose teardown needs
/// wire traffic.
pub struct AsyncDrop<'c> {
    channel: &'c DropChannel,
    message: DropMessage,
}

impl<'c> AsyncDrop<'c> {
    pub fn new(channel: &'c DropChannel, message: DropMessage) -> Self {
        AsyncDrop { channel, message }
    }
}

impl Drop for AsyncDrop<'_> {
    fn drop(&mut self) {
        if self.channel.try_send(self.message).is_err() {
            log::error!("Failed to drop {:?}: Drop channel full", self.message);
        }
    }
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropMessage {
    /// Close a socket slot.
    Socket(usize),
}

impl DropMessage {
    /// Run the wire-level teardown for this message.
    pub async fn run<V: Vendor>(
        &self,
        vendor: &V,
        ctx: &ModemContext,
        runner: &mut CommandRunnerGuard<'_>,
    ) -> Result<(), Error> {
        log::debug!("Sending drop command for {:?}", self);

        match self {
            &DropMessage::Socket(index) => {
                let state = ctx.sockets.state(index);
                let wire_id = state.wire_id();
                if wire_id == crate::sockets::SocketState::WIRE_NONE {
                    // Claimed but never opened on the wire.
                    return Ok(());
                }
                match vendor.close_socket(runner, wire_id, state.pdp_deact()).await {
                    // Closing is allowed to fail: the modem may have closed
                    // the socket on its own before we got here.
                    Err(Error::At(_)) | Err(Error::Unavailable) => Ok(()),
                    other => other,
                }
            }
        }
    }

    /// Clean-up that runs after the drop logic, whether or not it errored.
    pub fn clean_up(&self, ctx: &ModemContext) {
        log::debug!("Cleaning up after {:?}", self);
        match self {
            &DropMessage::Socket(index) => {
                ctx.sockets.release(index);
            }
        }
    }
}
