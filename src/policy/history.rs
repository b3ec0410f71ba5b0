use std::collections::VecDeque;

use crate::condition::ConditionLabel;
use crate::policy::types::{InterventionClass, InterventionRecord};

/// Trailing window of dominant labels, one entry per evaluation.
#[derive(Debug, Default)]
pub struct SustainHistory {
    entries: VecDeque<(f64, ConditionLabel)>,
}

/// How much of the trailing window one label accounted for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelShare {
    pub matching: usize,
    pub total: usize,
}

impl LabelShare {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matching as f64 / self.total as f64
        }
    }
}

impl SustainHistory {
    /// Appends and prunes everything older than twice the sustain window.
    pub fn record(&mut self, now: f64, label: ConditionLabel, window_s: f64) {
        self.entries.push_back((now, label));
        let cutoff = now - 2.0 * window_s;
        while matches!(self.entries.front(), Some(&(ts, _)) if ts < cutoff) {
            self.entries.pop_front();
        }
    }

    pub fn share(&self, label: ConditionLabel, now: f64, window_s: f64) -> LabelShare {
        let cutoff = now - window_s;
        let mut share = LabelShare {
            matching: 0,
            total: 0,
        };
        for &(ts, entry) in self.entries.iter().rev() {
            if ts < cutoff {
                break;
            }
            share.total += 1;
            if entry == label {
                share.matching += 1;
            }
        }
        share
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Time-ordered record of issued interventions for rate limiting.
#[derive(Debug, Default)]
pub struct InterventionLog {
    records: VecDeque<InterventionRecord>,
}

impl InterventionLog {
    pub fn push(&mut self, timestamp: f64, class: InterventionClass) {
        self.records.push_back(InterventionRecord { timestamp, class });
    }

    pub fn prune(&mut self, now: f64, window_s: f64) {
        while matches!(self.records.front(), Some(r) if now - r.timestamp >= window_s) {
            self.records.pop_front();
        }
    }

    pub fn count_within(&self, now: f64, window_s: f64) -> usize {
        self.records
            .iter()
            .filter(|r| now - r.timestamp < window_s)
            .count()
    }

    pub fn last(&self) -> Option<&InterventionRecord> {
        self.records.back()
    }

    pub fn records(&self) -> impl Iterator<Item = &InterventionRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
