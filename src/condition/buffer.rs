use std::collections::VecDeque;

use crate::condition::types::FeatureSample;
use crate::error::InputError;

/// What the buffered samples can vouch for. Feeds confidence and the not-used list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferEvidence {
    pub len: usize,
    pub has_gaze: bool,
    pub has_face: bool,
    pub has_expressivity: bool,
}

/// Time-ordered sample history bounded by age and by count.
pub struct SampleBuffer {
    samples: VecDeque<FeatureSample>,
    window_s: f64,
    max_samples: usize,
}

impl SampleBuffer {
    pub fn new(window_s: f64, max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples.min(256)),
            window_s,
            max_samples: max_samples.max(1),
        }
    }

    /// Validates ordering before anything is mutated.
    pub fn check(&self, sample: &FeatureSample) -> Result<(), InputError> {
        if !sample.timestamp.is_finite() {
            return Err(InputError::NonFiniteTimestamp(sample.timestamp));
        }
        if let Some(newest) = self.newest_timestamp() {
            if sample.timestamp < newest {
                return Err(InputError::NonMonotonicTimestamp {
                    previous: newest,
                    got: sample.timestamp,
                });
            }
        }
        sample.interaction.check_finite()
    }

    pub fn push(&mut self, sample: FeatureSample) -> Result<(), InputError> {
        self.check(&sample)?;
        let now = sample.timestamp;
        self.samples.push_back(sample);
        self.prune(now);
        Ok(())
    }

    fn prune(&mut self, now: f64) {
        let cutoff = now - self.window_s;
        while let Some(front) = self.samples.front() {
            if front.timestamp < cutoff || self.samples.len() > self.max_samples {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn newest_timestamp(&self) -> Option<f64> {
        self.samples.back().map(|s| s.timestamp)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureSample> {
        self.samples.iter()
    }

    pub fn evidence(&self) -> BufferEvidence {
        let mut evidence = BufferEvidence {
            len: self.samples.len(),
            ..Default::default()
        };
        for sample in &self.samples {
            evidence.has_gaze |= sample.gaze.is_some();
            evidence.has_face |= sample.quality.face_present;
            evidence.has_expressivity |= sample.expressivity.is_some();
        }
        evidence
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
