use core::net::IpAddr;
use embassy_futures::yield_now;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::{ErrorType, Read, Write};

use crate::drop::{AsyncDrop, DropMessage};
use crate::log;
use crate::modem::{CommandRunner, ModemContext};
use crate::sockets::{CLOSED, CONNECTED, READABLE};
use crate::vendor::Vendor;
use crate::Error;

use super::state::SocketState;

/// How long to wait for an async-connect URC before giving up on the chip.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(150);

/// A TCP stream over one vendor socket. Dropping it closes the socket and
/// frees the id, via the drop pump.
pub struct TcpSocket<'c, V: Vendor> {
    state: &'c SocketState,
    commands: CommandRunner<'c>,
    ctx: &'c ModemContext,
    vendor: V,
    _drop: AsyncDrop<'c>,
}

impl<'c, V: Vendor> TcpSocket<'c, V> {
    pub(crate) async fn connect(
        ctx: &'c ModemContext,
        vendor: V,
        peer: (IpAddr, u16),
    ) -> Result<TcpSocket<'c, V>, Error> {
        let (index, state) = ctx
            .sockets
            .claim(V::SOCKET_COUNT)
            .ok_or(Error::ResourceExhausted)?;

        // From here on, any failure path runs the close-and-release drop
        // logic, so a refused connect leaves no entry behind.
        let drop_guard = AsyncDrop::new(&ctx.drop_channel, DropMessage::Socket(index));

        {
            let runner = ctx.commands();
            let at = runner.lock().await?;
            let wire_id = vendor.open_tcp(&at, index, peer).await?;
            state.set_wire_id(wire_id);
            if !V::ASYNC_CONNECT {
                state.set(CONNECTED);
            }
        }

        if V::ASYNC_CONNECT {
            // The lock is released while the open URC is awaited, so other
            // traffic (and the close URC) can flow.
            let bits = with_timeout(CONNECT_TIMEOUT, state.wait_any(CONNECTED | CLOSED))
                .await
                .map_err(|_| Error::CommandTimeout)?;

            if bits & CLOSED != 0 {
                let code = state.error();
                log::warn!("connect to {:?} refused: {}", peer, code);
                return Err(match code {
                    0 => Error::Closed,
                    code => Error::Unknown(code),
                });
            }
        }

        Ok(TcpSocket {
            state,
            commands: ctx.commands(),
            ctx,
            vendor,
            _drop: drop_guard,
        })
    }

    /// Largest chunk a single send moves on this chip.
    pub fn mtu(&self) -> usize {
        V::TCP_MTU
    }

    /// Write at most one MTU worth of `bytes`. Returns 0 under chip
    /// back-pressure (retry later); anything else is how much was accepted.
    ///
    /// A failure mid-write leaves the modem wedged between command and
    /// payload, so the whole session is poisoned.
    pub async fn try_write(&self, bytes: &[u8]) -> Result<usize, Error> {
        if self.state.is(CLOSED) {
            return Err(Error::Closed);
        }

        let chunk = &bytes[..bytes.len().min(V::TCP_MTU)];
        let at = self.commands.lock().await?;
        match self.vendor.send(&at, self.state.wire_id(), chunk).await {
            Ok(accepted) => {
                drop(at);
                // don't starve readers while streaming
                yield_now().await;
                Ok(accepted)
            }
            Err(e) => {
                log::error!("mid-write failure, poisoning session: {:?}", e);
                self.state.set(CLOSED);
                self.ctx.close();
                Err(e)
            }
        }
    }

    /// Read into `buf`. Returns 0 at end-of-stream.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let bits = self.state.wait_any(READABLE | CLOSED).await;
            if bits & CLOSED != 0 {
                return Ok(0);
            }

            let at = self.commands.lock().await?;
            let data = self
                .vendor
                .read(&at, self.state.wire_id(), buf.len())
                .await?;
            drop(at);

            if data.bytes.is_empty() {
                // buffer drained; wait for the next readable edge
                self.state.clear(READABLE);
                continue;
            }

            buf[..data.bytes.len()].copy_from_slice(&data.bytes);
            return Ok(data.bytes.len());
        }
    }

    /// Close the stream. The vendor close verb runs on the drop pump;
    /// the id is released exactly once there.
    pub fn close(self) {
        self.state.set(CLOSED);
    }
}

impl<V: Vendor> ErrorType for TcpSocket<'_, V> {
    type Error = Error;
}

impl<V: Vendor> Read for TcpSocket<'_, V> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        TcpSocket::read(self, buf).await
    }
}

impl<V: Vendor> Write for TcpSocket<'_, V> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let written = self.try_write(buf).await?;
            if written > 0 {
                return Ok(written);
            }
            // 0 means back-pressure; the vendor already slept
        }
    }
}
