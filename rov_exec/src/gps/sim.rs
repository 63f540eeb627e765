//! Simulated receiver which replays a fixed set of sentences

use super::{GpsError, NmeaPort, NmeaPortOpener};

/// Sentences replayed by default, a mix of fixes and sentences the ingestor ignores.
const DEFAULT_SENTENCES: [&str; 4] = [
    "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47",
    "$GPGSV,1,1,00*79",
    "$GPRMC,225446,A,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E*68",
    "$GPGGA,092750.500,5321.6802,S,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*6E",
];

#[derive(Debug, Clone)]
pub struct SimNmeaOpener {
    sentences: Vec<String>,
}

struct SimNmeaPort {
    sentences: Vec<String>,
    next: usize,
}

impl SimNmeaOpener {
    pub fn new() -> Self {
        Self::from_sentences(&DEFAULT_SENTENCES)
    }

    pub fn from_sentences(sentences: &[&str]) -> Self {
        Self {
            sentences: sentences.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for SimNmeaOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaPortOpener for SimNmeaOpener {
    fn open(&mut self) -> Result<Box<dyn NmeaPort>, GpsError> {
        Ok(Box::new(SimNmeaPort {
            sentences: self.sentences.clone(),
            next: 0,
        }))
    }
}

impl NmeaPort for SimNmeaPort {
    fn read_line(&mut self) -> Result<Option<String>, GpsError> {
        if self.sentences.is_empty() {
            return Ok(None);
        }

        let line = self.sentences[self.next % self.sentences.len()].clone();
        self.next += 1;
        Ok(Some(line))
    }
}
