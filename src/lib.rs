#![no_std]
#![allow(async_fn_in_trait)]
#![allow(clippy::unnecessary_lazy_evaluations)]
// large enum variants are unavoidable in no_std, since we can't box things
#![allow(clippy::large_enum_variant, clippy::result_large_err)]

pub mod at_command;
pub mod config;
mod drop;
mod error;
pub mod modem;
pub mod pump;
pub mod read;
mod slot;
pub mod sockets;
mod util;
pub mod vendor;

pub use util::*;

#[cfg(all(feature = "log", feature = "defmt"))]
compile_error!("'log' and 'defmt' features are mutually exclusive");
#[cfg(not(any(feature = "log", feature = "defmt")))]
compile_error!("please enable a logging feature, e.g. 'log' or 'defmt'");
#[cfg(feature = "defmt")]
pub(crate) use defmt as log;
use embedded_io_async::{Read, Write};
#[cfg(feature = "log")]
pub(crate) use log;

pub use error::{AtError, Error};
pub use modem::power::PowerState;

/// This trait is for building a `BuildIo::IO` that implements [SplitIo].
///
/// The purpose of the trait is to let the user of this library plug in UART
/// driver types from whatever HAL they're using. The trait provides the
/// ability for the `RawIoPump` to construct/destruct (enable/disable) the
/// UART IO, and to re-clock it when the session machine probes baud rates.
pub trait BuildIo {
    type IO<'d>: SplitIo
    where
        Self: 'd;

    /// Construct a `BuildIo::IO` that implements [SplitIo], clocked at `baud`.
    fn build(&mut self, baud: u32) -> Self::IO<'_>;
}

/// Split self into a reader and a writer. See documentation on [SplitIo::split].
pub trait SplitIo: Sized {
    type Reader<'u>: Read
    where
        Self: 'u;
    type Writer<'u>: Write
    where
        Self: 'u;

    /// Split self into a reader and a writer.
    ///
    /// **NOTE**: This method **must not** be called with None. Implementations
    /// are allowed to panic on None. This method takes a `&mut Option<Self>`
    /// so that implementations can choose to borrow `Self`, or to take
    /// ownership of it. This is to maintain compatibility with as many HALs
    /// as possible.
    fn split(this: &mut Option<Self>) -> (Self::Reader<'_>, Self::Writer<'_>);
}

/// Power and reset line control.
///
/// Implementations own the power/reset GPIOs exclusively. The pulse widths
/// each chip expects are published in [vendor::module_timing]. `disable`
/// must leave the lines quiescent (stable for at least 100 ms) before
/// returning, and implementations are expected to release the pins
/// (reconfigure them as inputs) when dropped.
pub trait ModemPower {
    /// Power on the modem, e.g. by pulsing the modem power key pin.
    async fn enable(&mut self);

    /// Power off the modem, e.g. by pulsing the modem power key pin.
    async fn disable(&mut self);

    /// Reset the modem, e.g. by pulsing the modem reset pin.
    async fn reset(&mut self);

    /// Get the current power state of the modem, e.g. by sniffing the modem
    /// status pin.
    fn state(&mut self) -> PowerState;
}

/// Persistent storage for the consecutive-failure counter.
///
/// The counter lives in flash and drives the auto-recovery policy. A torn
/// write is acceptable, a non-integer value is not, so implementations
/// should use a key-value store with per-key write atomicity.
pub trait AttemptStore {
    /// Read the counter. A missing key reads as 0.
    fn load(&mut self) -> u16;

    /// Overwrite the counter.
    fn store(&mut self, attempts: u16);
}

/// This macro defines an embassy task wrapping one of the four pump types.
///
/// The host is expected to spawn all four pumps ([pump::TxPump],
/// [pump::RxPump], [pump::DropPump], [pump::RawIoPump]) for the modem to
/// make progress.
#[macro_export]
macro_rules! pump_task {
    ($name:ident, $type:ty) => {
        #[embassy_executor::task]
        pub(crate) async fn $name(mut pump: $type) {
            use $crate::pump::Pump;
            loop {
                if let Err(err) = pump.pump().await {
                    #[cfg(feature = "log")]
                    log::error!("Error pumping {} {:?}", stringify!($name), err);
                    #[cfg(feature = "defmt")]
                    defmt::error!("Error pumping {} {:?}", stringify!($name), err);
                }
            }
        }
    };
}
