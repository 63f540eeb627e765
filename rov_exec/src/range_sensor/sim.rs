//! Scripted distance source

use std::collections::VecDeque;

use super::{DistanceSource, RangeSample};

/// Replays a list of samples, then reports `Timeout` (nothing in range) forever.
///
/// Used as the range sensor when running without hardware.
#[derive(Debug, Default, Clone)]
pub struct SimRangeSensor {
    samples: VecDeque<RangeSample>,
    taken: usize,
}

impl SimRangeSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sensor which will return the given distances, in centimeters, in order.
    pub fn from_distances(distances: &[f64]) -> Self {
        Self {
            samples: distances.iter().map(|d| RangeSample::Distance(*d)).collect(),
            taken: 0,
        }
    }

    pub fn push(&mut self, sample: RangeSample) {
        self.samples.push_back(sample);
    }

    /// Number of measurements taken so far.
    pub fn num_taken(&self) -> usize {
        self.taken
    }
}

impl DistanceSource for SimRangeSensor {
    fn measure(&mut self) -> RangeSample {
        self.taken += 1;
        self.samples.pop_front().unwrap_or(RangeSample::Timeout)
    }
}
