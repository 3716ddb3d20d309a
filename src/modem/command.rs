use core::cmp::min;
use core::future::Future;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Receiver, Sender},
    mutex::{Mutex, MutexGuard},
};
use embassy_time::{with_timeout, Duration, Instant, TimeoutError};
use heapless::{String, Vec};

use crate::at_command::{at::At, AtRequest, AtResponse, ResponseCode};
use crate::error::AtError;
use crate::log;
use crate::modem::ModemContext;
use crate::Error;

/// The default timeout of AT commands.
pub const AT_DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Flush-after-abort tuning: up to three pings, 5 s each, 20 s overall.
const ABORT_PINGS: usize = 3;
const ABORT_PING_TIMEOUT: Duration = Duration::from_secs(5);
const ABORT_TOTAL_TIMEOUT: Duration = Duration::from_secs(20);

pub enum RawAtCommand {
    Text(String<256>),
    Binary(Vec<u8, 256>),
}

impl From<String<256>> for RawAtCommand {
    fn from(s: String<256>) -> Self {
        RawAtCommand::Text(s)
    }
}

impl RawAtCommand {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RawAtCommand::Text(s) => s.as_bytes(),
            RawAtCommand::Binary(b) => b,
        }
    }
}

/// Handle for issuing AT commands. Cheap to clone; every user goes through
/// [CommandRunner::lock], so at most one command is outstanding at a time.
#[derive(Clone)]
pub struct CommandRunner<'a> {
    ctx: &'a ModemContext,
    command_lock: &'a Mutex<CriticalSectionRawMutex, ()>,
    commands: Sender<'a, CriticalSectionRawMutex, RawAtCommand, 4>,
    responses: Receiver<'a, CriticalSectionRawMutex, ResponseCode, 1>,
}

impl<'a> CommandRunner<'a> {
    pub fn create(ctx: &'a ModemContext) -> Self {
        CommandRunner {
            ctx,
            command_lock: &ctx.command_lock,
            commands: ctx.commands.sender(),
            responses: ctx.generic_response.receiver(),
        }
    }
}

/// The held AT lock. Commands can only be issued through this guard, and
/// the mutex releases on every exit path.
pub struct CommandRunnerGuard<'a> {
    _commands_guard: MutexGuard<'a, CriticalSectionRawMutex, ()>,
    runner: &'a CommandRunner<'a>,
    timeout: Option<Duration>,
}

impl<'a> CommandRunner<'a> {
    /// Acquire the AT lock. Fails with [Error::Closed] once the session has
    /// been torn down.
    pub async fn lock(&'a self) -> Result<CommandRunnerGuard<'a>, Error> {
        if self.ctx.is_closed() {
            return Err(Error::Closed);
        }
        let guard = self.command_lock.lock().await;
        // Teardown may have raced the lock acquisition.
        if self.ctx.is_closed() {
            return Err(Error::Closed);
        }
        Ok(CommandRunnerGuard {
            _commands_guard: guard,
            runner: self,
            timeout: Some(AT_DEFAULT_TIMEOUT),
        })
    }
}

impl<'a> CommandRunnerGuard<'a> {
    async fn with_deadline<T, F: Future<Output = T>>(
        &self,
        timeout: Option<Duration>,
        future: F,
    ) -> Result<T, TimeoutError> {
        Ok(match timeout {
            Some(timeout) => with_timeout(timeout, future).await?,
            None => future.await,
        })
    }

    /// Send a request to the modem, but do not wait for a response.
    pub async fn send_request<R: AtRequest>(&self, request: &R) -> Result<(), TimeoutError> {
        self.with_deadline(self.timeout, async {
            self.runner.commands.send(request.encode().into()).await;
        })
        .await
    }

    /// Wait for the modem to return a specific response.
    pub async fn expect_response<T: AtResponse>(&self) -> Result<T, Error> {
        self.expect_response_with(self.timeout).await
    }

    async fn expect_response_with<T: AtResponse>(
        &self,
        timeout: Option<Duration>,
    ) -> Result<T, Error> {
        self.with_deadline(timeout, async {
            loop {
                let response = self.runner.responses.receive().await;

                match T::from_generic(response) {
                    Ok(response) => return Ok(response),
                    Err(ResponseCode::Error(error)) => return Err(error.into()),
                    Err(unknown_response) => {
                        log::warn!("Got unexpected response: {:?}", unknown_response)
                    }
                }
            }
        })
        .await?
    }

    /// Send raw bytes to the modem, e.g. a payload following the data
    /// prompt. Also the escape hatch for firmware-upload style hand-offs:
    /// the guard keeps every other task off the wire meanwhile.
    pub async fn send_bytes(&self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let mut chunk = Vec::new();
            let n = min(chunk.capacity(), bytes.len());
            chunk.extend_from_slice(&bytes[..n]).ok();
            bytes = &bytes[n..];
            self.runner.commands.send(RawAtCommand::Binary(chunk)).await;
        }
    }

    /// Send a request and wait for the modem to respond.
    pub async fn run<Request, Response>(&self, command: Request) -> Result<Response, Error>
    where
        Request: AtRequest<Response = Response>,
        Response: ExpectResponse,
    {
        self.run_with_timeout(self.timeout, command).await
    }

    /// Send a request and wait for the response, under the given deadline
    /// instead of the guard's.
    pub async fn run_with_timeout<Request, Response>(
        &self,
        timeout: Option<Duration>,
        command: Request,
    ) -> Result<Response, Error>
    where
        Request: AtRequest<Response = Response>,
        Response: ExpectResponse,
    {
        log::trace!("Running AT command: {:?}", command);
        self.with_deadline(timeout, async {
            self.runner.commands.send(command.encode().into()).await;
        })
        .await?;
        let result = Response::expect(self, timeout).await;

        if let Err(e) = &result {
            log::error!("AT command {:?} error: {:?}", command, e);
        }

        result
    }

    /// Run a long command that advertises `max_timeout` but may be cut
    /// short by an ambient deadline. On timeout the modem is mid-command,
    /// so the wire is flushed with empty pings until it answers again
    /// (the chips report `+CME ERROR: Command aborted` for the casualty).
    pub async fn run_abortable<Request, Response>(
        &self,
        max_timeout: Duration,
        command: Request,
    ) -> Result<Response, Error>
    where
        Request: AtRequest<Response = Response>,
        Response: ExpectResponse,
    {
        match self.run_with_timeout(Some(max_timeout), command).await {
            Err(Error::CommandTimeout) => {
                self.flush_aborted().await;
                Err(Error::CommandTimeout)
            }
            other => other,
        }
    }

    /// The empty-ping flush protocol. Ready for the next command when it
    /// returns; failures are logged, not propagated, so an abort never
    /// masks the original timeout.
    pub async fn flush_aborted(&self) {
        let started = Instant::now();

        for attempt in 0..ABORT_PINGS {
            if started.elapsed() > ABORT_TOTAL_TIMEOUT {
                break;
            }

            let flushed = self
                .with_deadline(Some(ABORT_PING_TIMEOUT), async {
                    self.runner.commands.send(At.encode().into()).await;
                    loop {
                        match self.runner.responses.receive().await {
                            ResponseCode::Ok(_) => return true,
                            ResponseCode::Error(AtError::Cme(detail)) => {
                                return detail.as_str() == "Command aborted"
                            }
                            ResponseCode::Error(_) => return false,
                            // stale lines of the aborted command
                            other => log::debug!("flushing stale response: {:?}", other),
                        }
                    }
                })
                .await;

            if matches!(flushed, Ok(true)) {
                log::debug!("aborted command flushed after {} ping(s)", attempt + 1);
                return;
            }
        }

        log::warn!("failed to flush aborted command");
    }

    /// Set the timeout of subsequent commands run through this guard.
    ///
    /// Note that the timeout defaults to [AT_DEFAULT_TIMEOUT].
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }
}

/// Implemented for (tuples of) AtResponse.
///
/// In order to support AtRequest::Response being a tuple of arbitrary size,
/// we implement the ExpectResponse trait for tuples with as many members as
/// we need.
pub trait ExpectResponse: Sized {
    async fn expect(
        runner: &CommandRunnerGuard<'_>,
        timeout: Option<Duration>,
    ) -> Result<Self, Error>;
}

impl<T: AtResponse> ExpectResponse for T {
    async fn expect(
        runner: &CommandRunnerGuard<'_>,
        timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        runner.expect_response_with(timeout).await
    }
}

impl<T: AtResponse, Y: AtResponse> ExpectResponse for (T, Y) {
    async fn expect(
        runner: &CommandRunnerGuard<'_>,
        timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        let r1 = runner.expect_response_with(timeout).await?;
        let r2 = runner.expect_response_with(timeout).await?;
        Ok((r1, r2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::generic::GenericOk;
    use futures::executor::block_on;

    fn queued_command(ctx: &ModemContext) -> Option<RawAtCommand> {
        ctx.commands.try_receive().ok()
    }

    #[test]
    fn closed_session_refuses_the_lock() {
        let ctx = ModemContext::new();
        ctx.close();
        let runner = ctx.commands();
        assert!(matches!(block_on(runner.lock()), Err(Error::Closed)));
    }

    #[test]
    fn error_final_line_fails_the_command() {
        let ctx = ModemContext::new();
        ctx.generic_response.try_send(ResponseCode::Error(AtError::Generic)).ok();

        let runner = ctx.commands();
        let guard = block_on(runner.lock()).unwrap();
        let result: Result<GenericOk, Error> = block_on(guard.run(At));
        assert!(matches!(result, Err(Error::At(AtError::Generic))));
        assert_eq!(queued_command(&ctx).unwrap().as_bytes(), b"AT\r");
    }

    #[test]
    fn flush_succeeds_on_the_abort_marker() {
        let ctx = ModemContext::new();
        ctx.generic_response
            .try_send(ResponseCode::Error(AtError::Cme(
                heapless::String::try_from("Command aborted").unwrap(),
            )))
            .ok();

        let runner = ctx.commands();
        let guard = block_on(runner.lock()).unwrap();
        block_on(guard.flush_aborted());

        // exactly one ping was needed
        assert_eq!(queued_command(&ctx).unwrap().as_bytes(), b"AT\r");
        assert!(queued_command(&ctx).is_none());
    }

    #[test]
    fn flush_swallows_stale_ok() {
        let ctx = ModemContext::new();
        ctx.generic_response
            .try_send(ResponseCode::Ok(GenericOk))
            .ok();

        let runner = ctx.commands();
        let guard = block_on(runner.lock()).unwrap();
        block_on(guard.flush_aborted());
        assert_eq!(queued_command(&ctx).unwrap().as_bytes(), b"AT\r");
    }
}
