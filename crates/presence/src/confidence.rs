//! Time-adaptive confidence accumulation

/// Low-pass filter over presence scores.
///
/// Frames that arrive close together lean on the running value; a frame
/// arriving after a gap carries more weight of its own.
#[derive(Debug, Clone)]
pub struct ConfidenceAccumulator {
    value: f32,
    limit: f32,
}

impl ConfidenceAccumulator {
    pub fn new(limit: f32) -> Self {
        Self {
            value: 0.0,
            limit: limit.abs(),
        }
    }

    /// Fold a score into the running confidence and return the new value
    pub fn update(&mut self, score: f32, elapsed_ms: u64) -> f32 {
        let score = if score.is_finite() { score } else { 0.0 };
        let weight = time_weight(elapsed_ms);

        let next = self.value * (0.7 * weight) + score * (0.3 + (1.0 - weight));
        self.value = next.clamp(-self.limit, self.limit);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

/// Trust in the running value, in [0.1, 0.9]
pub fn time_weight(elapsed_ms: u64) -> f32 {
    (1000.0 / (elapsed_ms as f32 + 1000.0)).clamp(0.1, 0.9)
}
