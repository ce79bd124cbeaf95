use std::time::{Duration, Instant};

/// Identifies one launched inference call.
///
/// `activation` changes every time the loop is (re)started, so results of a
/// call launched before a stop can be told apart from current ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickTicket {
    activation: u64,
    sequence: u64,
}

impl TickTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Interval gate for the live detection loop.
///
/// The host calls [`DetectionGate::try_launch`] on every redraw. A launch is
/// granted only while running, with no call outstanding and at least
/// `interval` after the previous launch, so at most one inference is ever in
/// flight and redraws in between are no-ops.
#[derive(Debug)]
pub struct DetectionGate {
    interval: Duration,
    running: bool,
    activation: u64,
    sequence: u64,
    last_launch: Option<Instant>,
    in_flight: Option<TickTicket>,
}

impl DetectionGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: false,
            activation: 0,
            sequence: 0,
            last_launch: None,
            in_flight: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn start(&mut self) {
        self.activation += 1;
        self.running = true;
        self.last_launch = None;
        self.in_flight = None;
    }

    /// Outstanding calls are orphaned: their results will be rejected.
    pub fn stop(&mut self) {
        self.running = false;
        self.in_flight = None;
    }

    pub fn try_launch(&mut self, now: Instant) -> Option<TickTicket> {
        if !self.running || self.in_flight.is_some() {
            return None;
        }
        if let Some(last) = self.last_launch {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.sequence += 1;
        let ticket = TickTicket {
            activation: self.activation,
            sequence: self.sequence,
        };
        self.last_launch = Some(now);
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Marks `ticket` finished. Returns false for stale tickets, whose
    /// results must be dropped.
    pub fn complete(&mut self, ticket: TickTicket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }
}
