//! Frame-aligned accumulation of per-speckle traces.

/// Concatenates per-frame traces into one trace per speckle slot.
///
/// Every trace always holds `frames * samples_per_frame` samples: frames
/// that produced nothing, or that detected fewer speckles than there are
/// slots, contribute zero blocks.
#[derive(Debug, Clone)]
pub struct SpeckleAccumulator {
    samples_per_frame: usize,
    max_speckles: usize,
    capacity: usize,
    frames: usize,
    traces: Vec<Vec<f64>>,
}

impl SpeckleAccumulator {
    /// Creates an empty accumulator with at most `max_speckles` slots.
    pub fn new(samples_per_frame: usize, max_speckles: usize) -> Self {
        Self {
            samples_per_frame,
            max_speckles,
            capacity: 0,
            frames: 0,
            traces: Vec::new(),
        }
    }

    /// Pre-sizes new slots for `frames` frames.
    pub fn with_frame_hint(mut self, frames: usize) -> Self {
        self.capacity = frames.saturating_mul(self.samples_per_frame);
        self
    }

    /// Appends one frame of traces, one per detected speckle.
    pub fn push_frame(&mut self, traces: &[Vec<f64>]) {
        let speckles = traces.len().min(self.max_speckles);
        if traces.len() > speckles {
            tracing::warn!(
                detected = traces.len(),
                slots = self.max_speckles,
                "Speckle slots exhausted"
            );
        }

        while self.traces.len() < speckles {
            let mut slot = Vec::with_capacity(self.capacity);
            slot.resize(self.frames * self.samples_per_frame, 0.0);
            self.traces.push(slot);
        }

        for (slot, trace) in self.traces.iter_mut().enumerate() {
            match traces.get(slot) {
                Some(samples) => {
                    debug_assert_eq!(samples.len(), self.samples_per_frame);
                    slot_append(trace, samples, self.samples_per_frame);
                }
                None => trace.resize(trace.len() + self.samples_per_frame, 0.0),
            }
        }
        self.frames += 1;
    }

    /// Appends a frame that contributed nothing.
    pub fn push_empty(&mut self) {
        self.push_frame(&[]);
    }

    /// Frames appended so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Speckle slots holding a trace.
    pub fn speckle_count(&self) -> usize {
        self.traces.len()
    }

    /// Traces accumulated so far, one per slot.
    pub fn traces(&self) -> &[Vec<f64>] {
        &self.traces
    }

    /// Consumes the accumulator and returns its traces.
    pub fn into_traces(self) -> Vec<Vec<f64>> {
        self.traces
    }
}

/// Appends exactly `block` samples, truncating or zero-extending `samples`.
fn slot_append(trace: &mut Vec<f64>, samples: &[f64], block: usize) {
    let take = samples.len().min(block);
    trace.extend_from_slice(&samples[..take]);
    trace.resize(trace.len() + (block - take), 0.0);
}
