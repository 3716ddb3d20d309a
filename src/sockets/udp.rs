use core::net::IpAddr;
use embassy_time::{with_timeout, Duration};

use crate::drop::{AsyncDrop, DropMessage};
use crate::modem::{CommandRunner, ModemContext};
use crate::sockets::{CLOSED, CONNECTED, READABLE};
use crate::vendor::{UdpWire, Vendor};
use crate::Error;

use super::state::SocketState;

const OPEN_TIMEOUT: Duration = Duration::from_secs(30);

/// A UDP socket over one vendor socket id.
pub struct UdpSocket<'c, V: Vendor> {
    state: &'c SocketState,
    commands: CommandRunner<'c>,
    vendor: V,
    peer: Option<(IpAddr, u16)>,
    wire: UdpWire,
    _drop: AsyncDrop<'c>,
}

impl<'c, V: Vendor> UdpSocket<'c, V> {
    pub(crate) async fn open(
        ctx: &'c ModemContext,
        vendor: V,
        peer: Option<(IpAddr, u16)>,
    ) -> Result<UdpSocket<'c, V>, Error> {
        let (index, state) = ctx
            .sockets
            .claim(V::SOCKET_COUNT)
            .ok_or(Error::ResourceExhausted)?;

        let drop_guard = AsyncDrop::new(&ctx.drop_channel, DropMessage::Socket(index));

        {
            let runner = ctx.commands();
            let at = runner.lock().await?;
            let wire_id = vendor.open_udp(&at, index).await?;
            state.set_wire_id(wire_id);
            if !V::ASYNC_CONNECT {
                state.set(CONNECTED);
            }
        }

        if V::ASYNC_CONNECT {
            let bits = with_timeout(OPEN_TIMEOUT, state.wait_any(CONNECTED | CLOSED))
                .await
                .map_err(|_| Error::CommandTimeout)?;
            if bits & CLOSED != 0 {
                return Err(match state.error() {
                    0 => Error::Closed,
                    code => Error::Unknown(code),
                });
            }
        }

        Ok(UdpSocket {
            state,
            commands: ctx.commands(),
            vendor,
            peer,
            wire: UdpWire::default(),
            _drop: drop_guard,
        })
    }

    /// Record the default destination. No wire traffic.
    pub fn connect(&mut self, peer: (IpAddr, u16)) {
        self.peer = Some(peer);
    }

    pub fn mtu(&self) -> usize {
        V::UDP_MTU
    }

    /// Send one datagram to the connected peer.
    pub async fn send(&mut self, datagram: &[u8]) -> Result<(), Error> {
        let peer = self.peer.ok_or(Error::NotConnected)?;
        self.send_to(peer, datagram).await
    }

    /// Send one datagram to `peer`.
    pub async fn send_to(&mut self, peer: (IpAddr, u16), datagram: &[u8]) -> Result<(), Error> {
        if datagram.len() > V::UDP_MTU {
            return Err(Error::PayloadTooLarge);
        }
        if self.state.is(CLOSED) {
            return Err(Error::Closed);
        }

        let at = self.commands.lock().await?;
        self.vendor
            .send_to(&at, self.state.wire_id(), &mut self.wire, peer, datagram)
            .await
    }

    /// Receive one datagram. Returns the payload length (truncated to
    /// `buf`) and the source address when the wire format carries one.
    pub async fn receive(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(usize, Option<(IpAddr, u16)>), Error> {
        loop {
            let bits = self.state.wait_any(READABLE | CLOSED).await;
            if bits & CLOSED != 0 {
                return Err(Error::Closed);
            }

            let at = self.commands.lock().await?;
            let data = self.vendor.receive(&at, self.state.wire_id()).await?;
            drop(at);

            if data.bytes.is_empty() {
                self.state.clear(READABLE);
                continue;
            }

            let len = data.bytes.len().min(buf.len());
            buf[..len].copy_from_slice(&data.bytes[..len]);
            return Ok((len, data.addr.or(self.peer)));
        }
    }

    /// Close the socket. The vendor close verb runs on the drop pump;
    /// the id is released exactly once there.
    pub fn close(self) {
        self.state.set(CLOSED);
    }
}
