// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Line ingestion from the field device.
//!
//! [`LineIngestor`] turns a byte stream into trimmed data lines. Read timeouts
//! are swallowed and a partial line survives them; the device preamble and
//! blank lines never leave the ingestor.

use crate::error::IngestError;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Capacity of the channel between the reader thread and the relay loop.
pub const LINE_CHANNEL_CAPACITY: usize = 64;

/// What a trimmed line is, as far as the ingestor cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Empty,
    /// Boot banner or column header printed by the device firmware.
    Preamble,
    Data,
}

/// Classify a trimmed line.
pub fn classify(line: &str) -> LineKind {
    if line.is_empty() {
        LineKind::Empty
    } else if line.starts_with("START") || line.to_ascii_lowercase().contains("theta,psi") {
        LineKind::Preamble
    } else {
        LineKind::Data
    }
}

/// Iterator of data lines read from a device.
pub struct LineIngestor<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    finished: bool,
}

impl LineIngestor<Box<dyn SerialPort>> {
    /// Open a serial device (8N1, no flow control).
    pub fn open(port: &str, baud: u32, read_timeout: Duration) -> Result<Self, IngestError> {
        let serial = serialport::new(port, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()
            .map_err(|source| IngestError::TransportUnavailable {
                port: port.to_string(),
                baud,
                source,
            })?;

        info!("Opened serial port: {} at {} baud", port, baud);
        Ok(Self::new(serial))
    }
}

impl<R: Read> LineIngestor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::with_capacity(128),
            finished: false,
        }
    }

    /// Read the next raw line, trimmed. `None` once the stream has ended.
    fn read_line(&mut self) -> Result<Option<String>, IngestError> {
        loop {
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) if self.buf.is_empty() => return Ok(None),
                Ok(_) => break,
                // Bytes read before the timeout stay in `buf`.
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    continue
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let bytes = std::mem::take(&mut self.buf);
        // Invalid UTF-8 becomes U+FFFD, which the decoder rejects.
        Ok(Some(String::from_utf8_lossy(&bytes).trim().to_string()))
    }
}

impl<R: Read> Iterator for LineIngestor<R> {
    type Item = Result<String, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.read_line() {
                Ok(Some(line)) => match classify(&line) {
                    LineKind::Data => return Some(Ok(line)),
                    LineKind::Preamble => debug!("Skipping device preamble: {}", line),
                    LineKind::Empty => {}
                },
                Ok(None) => self.finished = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Drive `ingestor` on a dedicated thread, handing lines over a bounded channel.
///
/// The channel closes when the stream ends or after a transport fault has
/// been delivered. The thread exits once the receiver is dropped.
pub fn spawn_reader<R>(
    ingestor: LineIngestor<R>,
    capacity: usize,
) -> Result<mpsc::Receiver<Result<String, IngestError>>, IngestError>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);

    thread::Builder::new()
        .name("serial-reader".into())
        .spawn(move || {
            for item in ingestor {
                if tx.blocking_send(item).is_err() {
                    debug!("Relay loop gone, reader exiting");
                    break;
                }
            }
        })?;

    Ok(rx)
}
