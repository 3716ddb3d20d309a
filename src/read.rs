use core::str::from_utf8;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, pipe::Pipe};
use embedded_io_async::Read;
use heapless::{String, Vec};

use crate::{log, Error};

/// The prompt the modem emits when a command carries a binary payload.
pub const DATA_PROMPT: &str = "> ";

/// Frames the modem RX byte stream into lines.
///
/// Lines are terminated by `\r\n`; a leading LF and stray whitespace are
/// absorbed, echoed command lines (which end in `\r\r` while echo is still
/// on) and empty lines are skipped. The data prompt `> ` arrives without a
/// terminator and is surfaced as its own pseudo-line.
/// Longest line the framer accepts. Sized for u-blox hex-mode socket
/// reads, where a 1024-byte payload arrives as 2048 hex digits inline.
pub const MAX_LINE: usize = 2304;

pub struct ModemReader<'context> {
    read: &'context Pipe<CriticalSectionRawMutex, 2048>,
    buffer: Vec<u8, 2560>,
}

impl<'context> ModemReader<'context> {
    pub fn new(read: &'context Pipe<CriticalSectionRawMutex, 2048>) -> ModemReader<'context> {
        ModemReader {
            read,
            buffer: Vec::new(),
        }
    }

    pub async fn read_line(&mut self) -> Result<String<MAX_LINE>, Error> {
        const LINE_END: u8 = b'\n';
        loop {
            if self.buffer.starts_with(DATA_PROMPT.as_bytes()) {
                // The prompt comes without a line terminator; surface it as-is
                // so the command path can observe it before writing a payload.
                self.consume(DATA_PROMPT.len());
                return Ok(String::try_from(DATA_PROMPT).unwrap_or_default());
            }

            if let Some(position) = self.buffer.iter().position(|&b| b == LINE_END) {
                let Ok(line) = from_utf8(&self.buffer[..position]) else {
                    self.consume(position + 1);
                    return Err(Error::InvalidUtf8);
                };

                // Skip empty lines, as well as echoed lines (which end with
                // \r\r while echo is still enabled).
                if line.trim().is_empty() || line.ends_with("\r\r") {
                    self.consume(position + 1);
                    continue;
                }

                log::trace!("RECV LINE: {:?}", line.trim());

                // The modem likes to be inconsistent with whitespace.
                let line = String::try_from(line.trim()).map_err(|_| Error::BufferOverflow)?;
                self.consume(position + 1);
                return Ok(line);
            }

            if self.buffer.len() == self.buffer.capacity() {
                // A line longer than the buffer means we lost framing.
                self.buffer.clear();
                return Err(Error::BufferOverflow);
            }

            let mut buf = [0u8; 256];
            let free = self.buffer.capacity() - self.buffer.len();
            let want = free.min(buf.len());
            let amount = Read::read(&mut self.read, &mut buf[..want])
                .await
                .map_err(|_| Error::Serial)?;

            self.buffer
                .extend_from_slice(&buf[..amount])
                .map_err(|_| Error::BufferOverflow)?;
        }
    }

    /// Read `buf.len()` raw payload bytes, consuming buffered bytes first so
    /// nothing is lost between line framing and payload reads.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        if self.buffer.len() >= buf.len() {
            buf.copy_from_slice(&self.buffer.as_slice()[..buf.len()]);
            self.consume(buf.len());
        } else {
            let buffered = self.buffer.len();
            buf[..buffered].copy_from_slice(self.buffer.as_slice());
            self.buffer.clear();
            self.read
                .read_exact(&mut buf[buffered..])
                .await
                .map_err(|_| Error::Serial)?;
        }

        Ok(())
    }

    fn consume(&mut self, n: usize) {
        self.buffer.rotate_left(n);
        self.buffer.truncate(self.buffer.len() - n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn reader_with(pipe: &Pipe<CriticalSectionRawMutex, 2048>, bytes: &[u8]) {
        assert_eq!(pipe.try_write(bytes).unwrap(), bytes.len());
    }

    #[test]
    fn frames_lines_and_absorbs_leading_lf() {
        let pipe = Pipe::new();
        reader_with(&pipe, b"\r\nOK\r\n\r\n+CEREG: 1\r\n");
        let mut reader = ModemReader::new(&pipe);

        assert_eq!(block_on(reader.read_line()).unwrap(), "OK");
        assert_eq!(block_on(reader.read_line()).unwrap(), "+CEREG: 1");
    }

    #[test]
    fn skips_echo_while_echo_is_on() {
        let pipe = Pipe::new();
        reader_with(&pipe, b"ATE0\r\r\nOK\r\n");
        let mut reader = ModemReader::new(&pipe);

        assert_eq!(block_on(reader.read_line()).unwrap(), "OK");
    }

    #[test]
    fn surfaces_data_prompt_without_terminator() {
        let pipe = Pipe::new();
        reader_with(&pipe, b"> ");
        let mut reader = ModemReader::new(&pipe);

        assert_eq!(block_on(reader.read_line()).unwrap(), DATA_PROMPT);
    }

    #[test]
    fn read_exact_drains_framing_buffer_first() {
        let pipe = Pipe::new();
        reader_with(&pipe, b"+QIRD: 4\r\nabcdOK\r\n");
        let mut reader = ModemReader::new(&pipe);

        assert_eq!(block_on(reader.read_line()).unwrap(), "+QIRD: 4");
        let mut payload = [0u8; 4];
        block_on(reader.read_exact(&mut payload)).unwrap();
        assert_eq!(&payload, b"abcd");
        assert_eq!(block_on(reader.read_line()).unwrap(), "OK");
    }
}
