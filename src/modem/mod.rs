pub mod command;
mod context;
pub mod power;

use core::marker::PhantomData;
use core::net::IpAddr;

use embassy_time::{with_timeout, Duration, Timer};
use heapless::{String, Vec};

pub use command::{CommandRunner, CommandRunnerGuard, RawAtCommand, AT_DEFAULT_TIMEOUT};
pub use context::ModemContext;
pub use power::PowerState;

use crate::at_command::{
    at::At,
    ate::SetEcho,
    atf::FactoryDefaults,
    cereg::ConfigureLteReports,
    cfun::{Functionality, SetFunctionality},
    cgmm::{GetModel, Model},
    cgmr::{FirmwareVersion, GetFirmwareVersion},
    cgreg::ConfigureGsmReports,
    cmee::{CmeErrorMode, ConfigureCmeErrors},
    cops::SelectOperator,
    cpin::{GetPinStatus, PinStatus},
    csq::{GetSignalQuality, SignalQuality},
    registration::{Registration, RegistrationStatus},
    GenericOk,
};
use crate::config::ModemConfig;
use crate::error::AtError;
use crate::log;
use crate::pump::{DropPump, RawIoPump, RxPump, Tunables, TxPump};
use crate::read::ModemReader;
use crate::sockets::{TcpSocket, UdpSocket};
use crate::vendor::Vendor;
use crate::{AttemptStore, BuildIo, Error, ModemPower};

const MODEM_POWER_TIMEOUT: Duration = Duration::from_secs(30);
const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(150);
const PSM_RECONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const BAUD_PROBE_SWEEPS: usize = 5;
const CONFIG_PASSES: usize = 4;
/// 40 polls of 250 ms each.
const SIM_POLLS: usize = 40;

/// What to do before the next open attempt, driven by the persistent
/// failure counter: every 8th consecutive failure soft-resets the module,
/// every 16th power-cycles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryAction {
    None,
    SoftReset,
    PowerCycle,
}

impl RecoveryAction {
    pub fn for_attempt(attempts: u16) -> Self {
        if attempts == 0 {
            // the counter wrapped
            RecoveryAction::PowerCycle
        } else if attempts % 16 == 0 {
            RecoveryAction::PowerCycle
        } else if attempts % 8 == 0 {
            RecoveryAction::SoftReset
        } else {
            RecoveryAction::None
        }
    }
}

/// The driver for one cellular modem.
///
/// Owns the power pins and the failure counter; shares wire access with the
/// pump tasks through the [ModemContext].
pub struct Modem<'c, P, S, V> {
    context: &'c ModemContext,
    power_signal: power::PowerSignalBroadcaster<'c>,
    commands: CommandRunner<'c>,
    power: P,
    store: S,
    vendor: V,
    config: ModemConfig,
    use_psm: bool,
    is_lte: bool,
    failed_to_connect: bool,
    registered: bool,
}

impl<'c, P: ModemPower, S: AttemptStore, V: Vendor> Modem<'c, P, S, V> {
    /// Build the modem handle and its four pump tasks. The host must spawn
    /// all pumps (see [pump_task](crate::pump_task)) for the driver to make
    /// progress.
    pub fn new<I: BuildIo>(
        io: I,
        power: P,
        store: S,
        vendor: V,
        context: &'c ModemContext,
        tunables: Tunables,
    ) -> (
        Modem<'c, P, S, V>,
        RawIoPump<'c, I>,
        TxPump<'c>,
        RxPump<'c, V>,
        DropPump<'c, V>,
    ) {
        let modem = Modem {
            commands: context.commands(),
            power_signal: context.power_signal.publisher(),
            context,
            power,
            store,
            vendor,
            config: ModemConfig::default(),
            use_psm: false,
            is_lte: true,
            failed_to_connect: false,
            registered: false,
        };

        let io_pump = RawIoPump {
            io,
            rx: &context.rx_pipe,
            tx: &context.tx_pipe,
            ctx: context,
            power_state: PowerState::Off,
            power_signal: context.power_signal.subscribe(),
        };

        let rx_pump = RxPump {
            reader: ModemReader::new(&context.rx_pipe),
            ctx: context,
            _vendor: PhantomData,
        };

        let tx_pump = TxPump {
            writer: &context.tx_pipe,
            commands: context.commands.receiver(),
            tunables,
        };

        let drop_pump = DropPump {
            ctx: context,
            vendor,
            power_signal: context.power_signal.subscribe(),
            power_state: PowerState::Off,
        };

        (modem, io_pump, tx_pump, rx_pump, drop_pump)
    }

    pub fn set_config(&mut self, config: ModemConfig) {
        self.config = config;
    }

    /// Bring the modem from powered-off to attached with an active data
    /// session. On failure the module is powered back down and the
    /// persistent failure counter advances the recovery policy.
    pub async fn open_network(&mut self) -> Result<(), Error> {
        let attempts = {
            let attempts = self.store.load().wrapping_add(1);
            self.store.store(attempts);
            attempts
        };

        match RecoveryAction::for_attempt(attempts) {
            RecoveryAction::None => {}
            RecoveryAction::SoftReset => {
                log::warn!("{} consecutive failures, soft-resetting", attempts);
                self.power.reset().await;
            }
            RecoveryAction::PowerCycle => {
                log::warn!("{} consecutive failures, power-cycling", attempts);
                self.power.disable().await;
            }
        }

        match self.try_open().await {
            Ok(()) => {
                self.store.store(0);
                self.failed_to_connect = false;
                log::info!("network open");
                Ok(())
            }
            Err(e) => {
                self.failed_to_connect = true;
                // best-effort teardown; never mask the original cause
                self.power_signal.broadcast(PowerState::Off);
                self.power.disable().await;
                Err(e)
            }
        }
    }

    async fn try_open(&mut self) -> Result<(), Error> {
        self.use_psm = self.config.use_psm;
        self.is_lte = true;

        log::info!("powering {} on", V::NAME);
        self.power_signal.broadcast(PowerState::On);
        with_timeout(MODEM_POWER_TIMEOUT, self.power.enable()).await?;

        self.probe_baud().await?;
        self.enter_ready().await?;
        self.configure().await?;
        self.register().await?;

        let at = self.commands.lock().await?;
        self.vendor.on_connected(&at, &self.config).await?;
        Ok(())
    }

    /// Find a rate the modem answers at; switch it to the preferred rate if
    /// it answered on a fallback.
    async fn probe_baud(&mut self) -> Result<(), Error> {
        let preferred = self.config.preferred_baud();
        let rates = self.config.baud_rates.clone();

        for sweep in 0..BAUD_PROBE_SWEEPS {
            for &baud in &rates {
                self.context.baud.signal(baud);
                // give the IO pump a beat to re-clock the UART
                Timer::after(Duration::from_millis(50)).await;

                let at = self.commands.lock().await?;
                if at
                    .run_with_timeout(Some(Duration::from_millis(250)), At)
                    .await
                    .is_err()
                {
                    continue;
                }

                if baud == preferred {
                    return Ok(());
                }

                log::info!("modem answered at {}, switching to {}", baud, preferred);
                self.vendor.set_baud(&at, preferred).await?;
                drop(at);
                self.context.baud.signal(preferred);
                Timer::after(Duration::from_millis(100)).await;

                let at = self.commands.lock().await?;
                for _ in 0..5 {
                    if at
                        .run_with_timeout(Some(Duration::from_millis(250)), At)
                        .await
                        .is_ok()
                    {
                        return Ok(());
                    }
                }
                // the switch did not take; keep sweeping
            }
            log::debug!("baud sweep {} found nothing", sweep + 1);
        }

        log::error!("modem not responding at any configured rate");
        Err(Error::CommandTimeout)
    }

    /// Echo off, verbose errors, SIM present.
    async fn enter_ready(&mut self) -> Result<(), Error> {
        let at = self.commands.lock().await?;

        // The chips are sluggish right after power-on; jiggle echo until it
        // sticks.
        for _ in 0..5 {
            if at
                .run_with_timeout(Some(Duration::from_secs(1)), SetEcho(false))
                .await
                .is_ok()
            {
                break;
            }
        }
        at.run(ConfigureCmeErrors(CmeErrorMode::Verbose)).await?;

        for _ in 0..SIM_POLLS {
            match at
                .run_with_timeout(Some(Duration::from_millis(250)), GetPinStatus)
                .await
            {
                Ok((PinStatus::Ready, _)) => return Ok(()),
                Ok((PinStatus::Locked, _)) => {
                    log::error!("SIM wants a PIN; not supported");
                    return Err(Error::At(AtError::Cme(
                        String::try_from("SIM PIN required").unwrap_or_default(),
                    )));
                }
                Ok((PinStatus::NotInserted, _)) => {}
                // transient: SIM busy and friends
                Err(Error::Unavailable | Error::CommandTimeout | Error::At(_)) => {}
                Err(e) => return Err(e),
            }
            Timer::after(Duration::from_millis(250)).await;
        }

        log::error!("SIM never became ready");
        Err(Error::CommandTimeout)
    }

    /// Run vendor configuration passes until one changes nothing. A pass
    /// that needs a reboot is applied, rebooted, and re-entered.
    async fn configure(&mut self) -> Result<(), Error> {
        for _ in 0..CONFIG_PASSES {
            let at = self.commands.lock().await?;
            at.run(SetFunctionality(V::OFFLINE_FUNCTIONALITY)).await?;
            let outcome = self.vendor.apply_config(&at, &self.config).await?;

            if outcome.needs_reboot {
                log::info!("configuration needs a module restart");
                self.vendor.reboot(&at).await?;
                drop(at);
                Timer::after(Duration::from_secs(2)).await;
                self.enter_ready().await?;
                continue;
            }

            if !outcome.changed {
                return Ok(());
            }
        }

        log::error!("configuration did not settle");
        Err(Error::Unavailable)
    }

    /// Radio on, operator selection, and the registration latch.
    async fn register(&mut self) -> Result<(), Error> {
        let at = self.commands.lock().await?;
        at.run(SetFunctionality(Functionality::Full)).await?;
        at.run(ConfigureLteReports(1)).await?;
        if V::SUPPORTS_GSM && self.config.wants_gsm() {
            at.run(ConfigureGsmReports(1)).await?;
        }

        // Reset the latch before kicking the search so a stale attach from
        // an earlier session cannot satisfy the wait.
        self.context.registration.signal(Registration::NONE);

        let select = match &self.config.operator {
            Some(operator) => SelectOperator::Manual(operator.clone()),
            None => SelectOperator::Automatic,
        };
        at.run_abortable(Duration::from_secs(180), select).await?;
        drop(at);

        let registration = self.wait_for_registration(REGISTRATION_TIMEOUT).await?;
        log::info!(
            "registered: {:?} ({})",
            registration.status,
            if registration.lte { "LTE" } else { "GSM" }
        );
        Ok(())
    }

    async fn wait_for_registration(&mut self, timeout: Duration) -> Result<Registration, Error> {
        let registration = with_timeout(
            timeout,
            self.context.registration.compare_wait(|r| {
                r.attached()
                    || matches!(
                        r.status,
                        RegistrationStatus::Denied | RegistrationStatus::Lost
                    )
            }),
        )
        .await
        .map_err(|_| Error::CommandTimeout)?;

        match registration.status {
            RegistrationStatus::Denied => Err(Error::RegistrationDenied),
            RegistrationStatus::Lost => Err(Error::ConnectionLost),
            _ => {
                self.is_lte = registration.lte;
                if !registration.lte {
                    // PSM is an LTE feature; a GSM attach clears it
                    self.use_psm = false;
                }
                self.registered = true;
                Ok(registration)
            }
        }
    }

    /// Tear the session down. Marks every socket closed, then either powers
    /// the modem off or, when PSM is active on an LTE attach, leaves it
    /// registered so it can doze.
    pub async fn close_network(&mut self) {
        self.context.sockets.close_all(false);

        let psm_sleep = self.use_psm && self.is_lte && self.registered;
        self.registered = false;

        match self.commands.lock().await {
            Ok(at) => {
                if psm_sleep {
                    log::info!("leaving modem registered for PSM sleep");
                    return;
                }
                if let Err(e) = self.vendor.power_down(&at, self.context).await {
                    log::warn!("power-down command failed: {:?}", e);
                }
            }
            Err(_) => log::debug!("session already closed, skipping power-down"),
        }

        self.power_signal.broadcast(PowerState::Off);
        if self.power.state() != PowerState::Off {
            // The chip ignored (or never received) the shutdown verb.
            log::warn!("modem still powered after AT close, pulsing the pin");
            self.power.disable().await;
        }
    }

    /// Rejoin the network after a PSM wake. The PSM-timer URC is routed
    /// statically, so repeated reconnects never double-register a handler;
    /// the attach itself goes through the normal registration latch.
    pub async fn connect_psm(&mut self) -> Result<(), Error> {
        self.power_signal.broadcast(PowerState::On);

        let at = self.commands.lock().await?;
        let mut awake = false;
        for _ in 0..5 {
            if at
                .run_with_timeout(Some(Duration::from_secs(1)), At)
                .await
                .is_ok()
            {
                awake = true;
                break;
            }
        }
        drop(at);
        if !awake {
            return Err(Error::CommandTimeout);
        }

        self.wait_for_registration(PSM_RECONNECT_TIMEOUT).await?;
        Ok(())
    }

    /// Final teardown: close the network and poison the session. Further
    /// command attempts fail with [Error::Closed].
    pub async fn close(&mut self) {
        self.close_network().await;
        self.context.close();
    }

    /// Resolve a hostname. Literal addresses short-circuit; otherwise one
    /// resolution is in flight at a time.
    pub async fn resolve(&self, host: &str) -> Result<Vec<IpAddr, 8>, Error> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(Vec::from_slice(&[ip]).unwrap_or_default());
        }

        let _dns = self.context.dns_lock.lock().await;
        let at = self.commands.lock().await?;
        self.vendor.resolve(&at, self.context, host).await
    }

    pub async fn tcp_connect(&self, ip: IpAddr, port: u16) -> Result<TcpSocket<'c, V>, Error> {
        TcpSocket::connect(self.context, self.vendor, (ip, port)).await
    }

    /// Open a UDP socket, optionally pre-connected to `peer`.
    pub async fn udp_open(
        &self,
        peer: Option<(IpAddr, u16)>,
    ) -> Result<UdpSocket<'c, V>, Error> {
        UdpSocket::open(self.context, self.vendor, peer).await
    }

    /// The modems offer no listening sockets.
    pub fn tcp_listen(&self, _port: u16) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    /// Take exclusive hold of the wire, e.g. for a firmware transfer. No
    /// command can interleave while the returned guard lives; use
    /// [CommandRunnerGuard::send_bytes] for the raw handoff.
    pub async fn pause(&self) -> Result<CommandRunnerGuard<'_>, Error> {
        self.commands.lock().await
    }

    pub async fn query_signal(&self) -> Result<SignalQuality, Error> {
        let at = self.commands.lock().await?;
        let (quality, _): (SignalQuality, GenericOk) = at.run(GetSignalQuality).await?;
        Ok(quality)
    }

    pub async fn query_model(&self) -> Result<Model, Error> {
        let at = self.commands.lock().await?;
        let (model, _): (Model, GenericOk) = at.run(GetModel).await?;
        Ok(model)
    }

    pub async fn query_firmware_version(&self) -> Result<FirmwareVersion, Error> {
        let at = self.commands.lock().await?;
        let (version, _): (FirmwareVersion, GenericOk) = at.run(GetFirmwareVersion).await?;
        Ok(version)
    }

    pub async fn query_iccid(&self) -> Result<String<22>, Error> {
        let at = self.commands.lock().await?;
        self.vendor.iccid(&at).await
    }

    /// Reset the active profile to factory defaults.
    pub async fn factory_reset(&self) -> Result<(), Error> {
        let at = self.commands.lock().await?;
        at.run(FactoryDefaults).await?;
        Ok(())
    }

    pub fn failed_to_connect(&self) -> bool {
        self.failed_to_connect
    }

    /// Completes when the modem reports a PSM cycle (`+QPSMTIMER` and
    /// friends). Hosts use this to pace their own sleep windows.
    pub async fn wait_psm_timer(&self) {
        self.context.psm_timer.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::RecoveryAction;

    #[test]
    fn recovery_cadence() {
        // Starting from 7 stored failures, eight more drive the counter to
        // 15, with a soft reset on the attempt that reads 8.
        let mut actions = heapless::Vec::<RecoveryAction, 8>::new();
        for attempt in 8..=15u16 {
            actions.push(RecoveryAction::for_attempt(attempt)).unwrap();
        }
        assert_eq!(actions[0], RecoveryAction::SoftReset);
        assert!(actions[1..]
            .iter()
            .all(|&a| a == RecoveryAction::None));

        // The sixteenth consecutive failure powers the module off.
        assert_eq!(RecoveryAction::for_attempt(16), RecoveryAction::PowerCycle);

        // Multiples keep the cadence.
        assert_eq!(RecoveryAction::for_attempt(24), RecoveryAction::SoftReset);
        assert_eq!(RecoveryAction::for_attempt(32), RecoveryAction::PowerCycle);

        // Wrap-around still recovers.
        assert_eq!(RecoveryAction::for_attempt(0), RecoveryAction::PowerCycle);
    }
}
