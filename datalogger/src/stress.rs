//! Throughput accounting for the store load generator

use std::time::{Duration, Instant};

/// Throughput sample reported about once per second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    /// Requests sent since the generator started
    pub total: u64,

    /// Requests sent since the previous sample
    pub per_second: u64,

    /// Moving average of `per_second`
    pub average: u64,
}

/// Counts sent requests and produces [`Throughput`] samples
///
/// The clock is only consulted every [`CHECK_EVERY`](Self::CHECK_EVERY)
/// requests so timing does not dominate the send loop.
#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    total: u64,
    previous: u64,
    average: u64,
    next_report: Instant,
}

impl ThroughputMeter {
    /// Requests between clock checks
    pub const CHECK_EVERY: u64 = 1000;

    /// Minimum time between samples
    pub const INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(start: Instant) -> Self {
        Self {
            total: 0,
            previous: 0,
            average: 0,
            next_report: start + Self::INTERVAL,
        }
    }

    /// Count one sent request; returns a sample when one is due
    pub fn tick(&mut self, now: Instant) -> Option<Throughput> {
        self.total += 1;

        if self.total % Self::CHECK_EVERY != 0 || now <= self.next_report {
            return None;
        }

        let per_second = self.total - self.previous;
        self.average = if self.average == 0 {
            per_second
        } else {
            self.average * 5 / 6 + per_second / 6
        };

        self.previous = self.total;
        self.next_report = now + Self::INTERVAL;

        Some(Throughput {
            total: self.total,
            per_second,
            average: self.average,
        })
    }

    /// Requests counted so far
    pub fn total(&self) -> u64 {
        self.total
    }
}
