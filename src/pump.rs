use core::cmp::min;
use core::marker::PhantomData;
use core::str::from_utf8;
use embassy_futures::select::{select4, Either4};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::Receiver,
    pipe::Pipe,
};
use embassy_time::{with_timeout, Duration, Timer};
use embedded_io_async::{Read, Write};
use heapless::Vec;

use crate::at_command::{AtParseLine, ResponseCode, SocketData, Urc, DATA_CHUNK};
use crate::log;
use crate::modem::{ModemContext, PowerState, RawAtCommand};
use crate::modem::power::PowerSignalListener;
use crate::read::ModemReader;
use crate::sockets::{SocketState, CLOSED, CONNECTED, READABLE};
use crate::vendor::Vendor;
use crate::{BuildIo, Error, SplitIo};

pub const PUMP_COUNT: usize = 4;

pub trait Pump {
    type Err;
    async fn pump(&mut self) -> Result<(), Self::Err>;
}

/// Delays the transmit side honors. The inter-command delay runs before
/// every textual command; the data delay paces individual payload bytes on
/// chips that need it.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tunables {
    pub inter_command_delay: Duration,
    pub data_delay: Option<Duration>,
}

impl Default for Tunables {
    fn default() -> Self {
        Tunables {
            inter_command_delay: Duration::from_millis(10),
            data_delay: None,
        }
    }
}

/// Reads lines off the modem and routes them: URCs to their owners, data
/// payloads inline, everything else to the single pending command.
pub struct RxPump<'context, V: Vendor> {
    pub(crate) reader: ModemReader<'context>,
    pub(crate) ctx: &'context ModemContext,
    pub(crate) _vendor: PhantomData<V>,
}

impl<V: Vendor> RxPump<'_, V> {
    fn socket(&self, wire_id: u8) -> Option<&SocketState> {
        let state = self.ctx.sockets.by_wire_id(wire_id);
        if state.is_none() {
            log::warn!("URC for unknown socket id {}", wire_id);
        }
        state
    }

    fn route_urc(&mut self, urc: Urc) {
        match urc {
            Urc::SocketOpened { id, result } => {
                if let Some(state) = self.socket(id) {
                    if result == 0 {
                        state.set(CONNECTED);
                    } else {
                        state.set_error(result);
                        state.set(CLOSED);
                    }
                }
            }
            Urc::SocketReadable { id } => {
                if let Some(state) = self.socket(id) {
                    state.set(READABLE);
                }
            }
            Urc::SocketClosed { id } => {
                if let Some(state) = self.socket(id) {
                    state.set(CLOSED);
                }
            }
            Urc::PdpDeactivated => {
                log::warn!("PDP context deactivated, closing all sockets");
                self.ctx.sockets.close_all(true);
            }
            Urc::Dns(event) => self.ctx.dns_events.send(event),
            Urc::Registration(registration) => {
                log::info!("registration status: {:?}", registration);
                self.ctx.registration.signal(registration);
            }
            Urc::PsmTimer => self.ctx.psm_timer.signal(()),
            Urc::PoweredDown => self.ctx.powered_down.signal(()),
            Urc::Ignored => {}
        }
    }
}

impl<V: Vendor> Pump for RxPump<'_, V> {
    type Err = Error;

    async fn pump(&mut self) -> Result<(), Self::Err> {
        let line = self.reader.read_line().await?;

        if line.is_empty() {
            log::warn!("received empty line from modem");
            return Ok(());
        }

        // URCs first: a line can never be both, and command responses must
        // not swallow unsolicited traffic.
        if let Some(urc) = V::classify_urc(&line) {
            log::debug!("Got URC: {:?}", line.as_str());
            self.route_urc(urc);
            return Ok(());
        }

        // Binary payload headers: the bytes follow immediately and must be
        // consumed before the next line is framed.
        if let Some(header) = V::data_header(&line) {
            let mut bytes = Vec::<u8, DATA_CHUNK>::new();
            bytes
                .resize_default(min(header.len, bytes.capacity()))
                .ok();
            self.reader.read_exact(&mut bytes).await?;

            let data = ResponseCode::Data(SocketData {
                addr: header.addr,
                bytes,
            });
            if with_timeout(Duration::from_secs(10), self.ctx.generic_response.send(data))
                .await
                .is_err()
            {
                log::error!("message queue send timed out");
            }
            return Ok(());
        }

        if let Ok(response) = ResponseCode::from_line(&line) {
            log::debug!("Got response: {:?}", line.as_str());
            if with_timeout(
                Duration::from_secs(10),
                self.ctx.generic_response.send(response),
            )
            .await
            .is_err()
            {
                log::error!("message queue send timed out");
            }
        } else {
            // The modem likely sent us gibberish we could not understand.
            log::error!("Got unknown response: {:?}", line.as_str());
        }

        Ok(())
    }
}

/// Drains the command channel onto the UART TX pipe.
pub struct TxPump<'context> {
    pub(crate) writer: &'context Pipe<CriticalSectionRawMutex, 2048>,
    pub(crate) commands: Receiver<'context, CriticalSectionRawMutex, RawAtCommand, 4>,
    pub(crate) tunables: Tunables,
}

impl Pump for TxPump<'_> {
    type Err = Error;

    async fn pump(&mut self) -> Result<(), Self::Err> {
        let command = self.commands.receive().await;
        match &command {
            RawAtCommand::Text(text) => {
                Timer::after(self.tunables.inter_command_delay).await;
                log::debug!("Write to modem: {:?}", text.as_str());
                self.writer.write_all(text.as_bytes()).await;
            }
            RawAtCommand::Binary(bytes) => {
                log::debug!("Write {} bytes to modem", bytes.len());
                match self.tunables.data_delay {
                    None => {
                        self.writer.write_all(bytes).await;
                    }
                    Some(delay) => {
                        for &byte in bytes.iter() {
                            self.writer.write_all(&[byte]).await;
                            Timer::after(delay).await;
                        }
                    }
                }
            }
        }
        self.writer.flush().await.ok(/* infallible */);

        Ok(())
    }
}

/// Runs deferred socket teardown off the drop channel.
pub struct DropPump<'context, V: Vendor> {
    pub(crate) ctx: &'context ModemContext,
    pub(crate) vendor: V,
    pub(crate) power_signal: PowerSignalListener<'context>,
    pub(crate) power_state: PowerState,
}

impl<V: Vendor> Pump for DropPump<'_, V> {
    type Err = Error;

    async fn pump(&mut self) -> Result<(), Self::Err> {
        use futures::{select_biased, FutureExt};

        select_biased! {
            power_state = self.power_signal.listen().fuse() => {
                self.power_state = power_state;
            }
            drop_message = self.ctx.drop_channel.receive().fuse() => {
                if self.power_state == PowerState::On && !self.ctx.is_closed() {
                    // run the drop command, abort if power state changes
                    let result = select_biased! {
                        power_state = self.power_signal.listen().fuse() => {
                            self.power_state = power_state;
                            Ok(())
                        }
                        result = async {
                            let runner = self.ctx.commands();
                            let mut runner = runner.lock().await?;
                            drop_message.run(&self.vendor, self.ctx, &mut runner).await
                        }.fuse() => result,
                    };

                    // clean up regardless of whether the drop command succeeded
                    drop_message.clean_up(self.ctx);
                    result?;
                } else {
                    drop_message.clean_up(self.ctx);
                }
            },
        }

        Ok(())
    }
}

/// Owns the UART. Bridges it to the TX/RX pipes, parks while the modem is
/// off, and rebuilds the IO when the requested baud rate changes.
pub struct RawIoPump<'context, RW> {
    pub(crate) io: RW,
    /// sends data to the rx pump
    pub(crate) rx: &'context Pipe<CriticalSectionRawMutex, 2048>,
    /// reads data from the tx pump
    pub(crate) tx: &'context Pipe<CriticalSectionRawMutex, 2048>,
    pub(crate) ctx: &'context ModemContext,
    pub(crate) power_signal: PowerSignalListener<'context>,
    pub(crate) power_state: PowerState,
}

impl<RW: 'static + BuildIo> RawIoPump<'_, RW> {
    pub async fn high_power_pump(&mut self) -> Result<(), Error> {
        let baud = self.ctx.baud.current();
        let mut io = Some(self.io.build(baud));
        let (mut reader, mut writer) = SplitIo::split(&mut io);

        loop {
            let mut tx_buf = [0u8; 256];
            let mut rx_buf = [0u8; 256];

            match select4(
                self.tx.read(&mut tx_buf),
                reader.read(&mut rx_buf),
                self.power_signal.listen(),
                self.ctx.baud.compare_wait(move |b| *b != baud),
            )
            .await
            {
                Either4::First(bytes) => {
                    writer
                        .write_all(&tx_buf[..bytes])
                        .await
                        .map_err(|_| Error::Serial)?;
                    writer.flush().await.map_err(|_| Error::Serial)?;
                }
                Either4::Second(result) => {
                    let bytes = result.map_err(|_| Error::Serial)?;

                    match from_utf8(&rx_buf[..bytes]) {
                        Ok(line) => log::trace!("BYTES READ {:?}", line),
                        Err(_) => log::trace!("READ INVALID {:?}", &rx_buf[..bytes]),
                    }

                    self.rx.write_all(&rx_buf[..bytes]).await;
                    self.rx.flush().await.ok(/* infallible */);
                }
                Either4::Third(result) => {
                    self.power_state = result;
                    if self.power_state != PowerState::On {
                        break Ok(());
                    }
                }
                Either4::Fourth(_) => {
                    // re-clock: rebuild the IO at the new rate
                    break Ok(());
                }
            }
        }
    }

    pub async fn low_power_pump(&mut self) {
        self.power_state = self.power_signal.listen().await;
    }
}

impl<RW: 'static + BuildIo> Pump for RawIoPump<'_, RW> {
    type Err = Error;

    async fn pump(&mut self) -> Result<(), Self::Err> {
        if self.power_state != PowerState::Off {
            self.high_power_pump().await?;
        } else {
            self.low_power_pump().await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::RegistrationStatus;
    use crate::sockets::state::CONNECTED;
    use crate::vendor::Bg96;
    use futures::executor::block_on;

    fn rx_pump(ctx: &ModemContext) -> RxPump<'_, Bg96> {
        RxPump {
            reader: ModemReader::new(&ctx.rx_pipe),
            ctx,
            _vendor: PhantomData,
        }
    }

    fn feed(ctx: &ModemContext, bytes: &[u8]) {
        assert_eq!(ctx.rx_pipe.try_write(bytes).unwrap(), bytes.len());
    }

    #[test]
    fn urcs_never_reach_the_response_channel() {
        let ctx = ModemContext::new();
        let (_, state) = ctx.sockets.claim(12).unwrap();
        state.set_wire_id(0);
        let mut pump = rx_pump(&ctx);

        // a URC interleaved into a command's response body
        feed(&ctx, b"+QIURC: \"recv\",0\r\n+CSQ: 17,99\r\nOK\r\n");

        block_on(pump.pump()).unwrap();
        assert!(state.is(READABLE));
        // nothing was forwarded for the URC
        assert!(ctx.generic_response.try_receive().is_err());

        block_on(pump.pump()).unwrap();
        assert!(matches!(
            ctx.generic_response.try_receive(),
            Ok(ResponseCode::Line(_))
        ));

        block_on(pump.pump()).unwrap();
        assert!(matches!(
            ctx.generic_response.try_receive(),
            Ok(ResponseCode::Ok(_))
        ));
    }

    #[test]
    fn connect_urc_drives_socket_state() {
        let ctx = ModemContext::new();
        let (_, state) = ctx.sockets.claim(12).unwrap();
        state.set_wire_id(0);
        let mut pump = rx_pump(&ctx);

        feed(&ctx, b"+QIOPEN: 0,0\r\n");
        block_on(pump.pump()).unwrap();
        assert!(state.is(CONNECTED));

        feed(&ctx, b"+QIURC: \"closed\",0\r\n");
        block_on(pump.pump()).unwrap();
        assert!(state.is(CLOSED));
    }

    #[test]
    fn refused_connect_records_the_code() {
        let ctx = ModemContext::new();
        let (_, state) = ctx.sockets.claim(12).unwrap();
        state.set_wire_id(0);
        let mut pump = rx_pump(&ctx);

        feed(&ctx, b"+QIOPEN: 0,566\r\n");
        block_on(pump.pump()).unwrap();
        assert!(state.is(CLOSED));
        assert!(!state.is(CONNECTED));
        assert_eq!(state.error(), 566);
    }

    #[test]
    fn framed_payload_is_consumed_before_the_final_line() {
        let ctx = ModemContext::new();
        let mut pump = rx_pump(&ctx);

        feed(&ctx, b"+QIRD: 4\r\nHTTP\r\nOK\r\n");

        block_on(pump.pump()).unwrap();
        let Ok(ResponseCode::Data(data)) = ctx.generic_response.try_receive() else {
            panic!("expected the payload");
        };
        assert_eq!(data.bytes.as_slice(), b"HTTP");

        block_on(pump.pump()).unwrap();
        assert!(matches!(
            ctx.generic_response.try_receive(),
            Ok(ResponseCode::Ok(_))
        ));
    }

    #[test]
    fn registration_urc_moves_the_latch() {
        let ctx = ModemContext::new();
        let mut pump = rx_pump(&ctx);

        feed(&ctx, b"+CEREG: 5\r\n");
        block_on(pump.pump()).unwrap();
        let registration = ctx.registration.current();
        assert_eq!(registration.status, RegistrationStatus::RegisteredRoaming);
        assert!(registration.lte);
    }

    #[test]
    fn pdp_loss_closes_every_claimed_socket() {
        let ctx = ModemContext::new();
        let (_, a) = ctx.sockets.claim(12).unwrap();
        a.set_wire_id(0);
        let (_, b) = ctx.sockets.claim(12).unwrap();
        b.set_wire_id(1);
        let mut pump = rx_pump(&ctx);

        feed(&ctx, b"+QIURC: \"pdpdeact\",1\r\n");
        block_on(pump.pump()).unwrap();
        assert!(a.is(CLOSED) && a.pdp_deact());
        assert!(b.is(CLOSED) && b.pdp_deact());
    }
}
