//! GPS ingestion parameters

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GpsParams {
    /// Serial device the receiver is attached to
    pub port: String,

    pub baud_rate: u32,

    /// Serial read timeout. A read that times out is not an error.
    ///
    /// Units: milliseconds
    pub read_timeout_ms: u64,

    /// Delay between processing two lines, throttles CPU usage.
    ///
    /// Units: milliseconds
    pub poll_interval_ms: u64,

    /// Wait after the first failure to open or read the port. Doubles on each consecutive
    /// failure.
    ///
    /// Units: seconds
    pub retry_backoff_s: f64,

    /// Upper limit on the wait between retries.
    ///
    /// Units: seconds
    pub max_backoff_s: f64,

    /// Give up after this many consecutive failures. Retries forever if not set.
    pub max_retries: Option<u32>,
}

impl Default for GpsParams {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".into(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            poll_interval_ms: 200,
            retry_backoff_s: 5.0,
            max_backoff_s: 60.0,
            max_retries: None,
        }
    }
}
