/// Pull-based emission limiter. Owns no timer; the caller drives it with `now`.
#[derive(Debug, Clone)]
pub struct EmissionScheduler {
    interval_s: f64,
    last_emission: Option<f64>,
}

impl EmissionScheduler {
    pub fn new(interval_s: f64) -> Self {
        Self {
            interval_s,
            last_emission: None,
        }
    }

    /// Seconds until the next emission is allowed, 0 when due.
    pub fn wait_s(&self, now: f64) -> f64 {
        match self.last_emission {
            Some(last) => (self.interval_s - (now - last)).max(0.0),
            None => 0.0,
        }
    }

    pub fn is_due(&self, now: f64) -> bool {
        match self.last_emission {
            Some(last) => now - last >= self.interval_s,
            None => true,
        }
    }

    /// Claims the emission slot for `now` if due.
    pub fn try_claim(&mut self, now: f64) -> bool {
        if self.is_due(now) {
            self.last_emission = Some(now);
            true
        } else {
            false
        }
    }

    pub fn last_emission(&self) -> Option<f64> {
        self.last_emission
    }

    pub fn reset(&mut self) {
        self.last_emission = None;
    }
}
