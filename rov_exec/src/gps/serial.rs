//! Serial port connection to the receiver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serialport::SerialPort;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::time::Duration;

use super::{GpsError, GpsParams, NmeaPort, NmeaPortOpener};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest valid NMEA 0183 sentence, including the line ending.
const MAX_SENTENCE_LEN: usize = 82;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Opens the serial device named in the parameters.
#[derive(Debug, Clone)]
pub struct SerialOpener {
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

pub struct SerialNmeaPort<R = BufReader<Box<dyn SerialPort>>> {
    reader: R,

    /// Bytes of a line which is still arriving, never more than a sentence
    partial: Vec<u8>,

    /// Set while skipping the rest of an overlong line
    discarding: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SerialOpener {
    pub fn new(params: &GpsParams) -> Self {
        Self {
            path: params.port.clone(),
            baud_rate: params.baud_rate,
            timeout: Duration::from_millis(params.read_timeout_ms),
        }
    }
}

impl NmeaPortOpener for SerialOpener {
    fn open(&mut self) -> Result<Box<dyn NmeaPort>, GpsError> {
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(self.timeout)
            .open()?;

        Ok(Box::new(SerialNmeaPort::new(BufReader::new(port))))
    }
}

impl<R: BufRead> SerialNmeaPort<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            partial: Vec::with_capacity(MAX_SENTENCE_LEN),
            discarding: false,
        }
    }
}

impl<R: BufRead + Send> NmeaPort for SerialNmeaPort<R> {
    fn read_line(&mut self) -> Result<Option<String>, GpsError> {
        // `partial` is cleared whenever it fills up, so the limit is never zero
        let limit = (MAX_SENTENCE_LEN - self.partial.len()) as u64;

        match self.reader.by_ref().take(limit).read_until(b'\n', &mut self.partial) {
            Ok(0) => Err(GpsError::Disconnected),
            Ok(_) if self.partial.ends_with(b"\n") => {
                let line = decode_ascii(&self.partial);
                self.partial.clear();

                match std::mem::take(&mut self.discarding) {
                    true => Ok(None),
                    false => Ok(Some(line)),
                }
            }
            Ok(_) if self.partial.len() >= MAX_SENTENCE_LEN => {
                if !self.discarding {
                    debug!("Discarding GPS line longer than {} bytes", MAX_SENTENCE_LEN);
                }
                self.discarding = true;
                self.partial.clear();
                Ok(None)
            }
            // End of stream part way through a line
            Ok(_) => Err(GpsError::Disconnected),
            // Bytes read before the timeout stay in `partial` for the next call
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) => Err(GpsError::Io(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Decode as ASCII, dropping anything that isn't, and trim line endings.
fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

    /// Hands out one scripted chunk or error per read, then end of stream.
    struct ScriptedRead {
        chunks: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedRead {
        fn port(chunks: Vec<io::Result<Vec<u8>>>) -> SerialNmeaPort<BufReader<Self>> {
            SerialNmeaPort::new(BufReader::new(Self {
                chunks: chunks.into(),
            }))
        }
    }

    impl Read for ScriptedRead {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Ok(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(Ok(chunk.split_off(n)));
                    }
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn timed_out() -> io::Result<Vec<u8>> {
        Err(io::Error::new(ErrorKind::TimedOut, "timed out"))
    }

    #[test]
    fn test_decode_ascii() {
        assert_eq!(decode_ascii(b"$GPGGA,1*00\r\n"), "$GPGGA,1*00");
        assert_eq!(decode_ascii(b"\xff$GP\xfeRMC\r\n"), "$GPRMC");
        assert_eq!(decode_ascii(b"\r\n"), "");
    }

    #[test]
    fn test_line_split_by_timeout() {
        let (head, tail) = GGA.split_at(20);
        let mut port = ScriptedRead::port(vec![
            Ok(head.as_bytes().to_vec()),
            timed_out(),
            Ok(format!("{}\r\n", tail).into_bytes()),
        ]);

        assert_eq!(port.read_line().unwrap(), None);
        assert_eq!(port.read_line().unwrap(), Some(GGA.to_string()));
        assert!(matches!(port.read_line(), Err(GpsError::Disconnected)));
    }

    #[test]
    fn test_overlong_line_is_discarded() {
        let mut noise = vec![b'x'; 300];
        noise.extend_from_slice(b"\r\n");

        let mut port = ScriptedRead::port(vec![
            Ok(noise),
            Ok(format!("{}\r\n", GGA).into_bytes()),
        ]);

        let mut lines = Vec::new();
        loop {
            match port.read_line() {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => assert!(port.partial.len() < MAX_SENTENCE_LEN),
                Err(_) => break,
            }
        }

        assert_eq!(lines, vec![GGA.to_string()]);
    }

    #[test]
    fn test_buffer_bounded_without_line_endings() {
        let mut chunks = Vec::new();
        for _ in 0..50 {
            chunks.push(Ok(vec![b'7'; 40]));
            chunks.push(timed_out());
        }
        let mut port = ScriptedRead::port(chunks);

        loop {
            match port.read_line() {
                Ok(line) => {
                    assert_eq!(line, None);
                    assert!(port.partial.len() < MAX_SENTENCE_LEN);
                }
                Err(e) => {
                    assert!(matches!(e, GpsError::Disconnected));
                    break;
                }
            }
        }
    }

    #[test]
    fn test_missing_device() {
        let params = GpsParams {
            port: "/dev/this-gps-does-not-exist".into(),
            ..Default::default()
        };

        assert!(SerialOpener::new(&params).open().is_err());
    }
}
