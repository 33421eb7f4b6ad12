//! Short history of integer samples with running extremes.

/// Number of samples kept per signal
pub const MAX_SAMPLE_VALS: usize = 6;

/// Most-recent-first window of samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleWindow {
    values: [i32; MAX_SAMPLE_VALS],
    min: i32,
    max: i32,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new sample, dropping the oldest one.
    pub fn update(&mut self, sample: i32) {
        self.values.rotate_right(1);
        self.values[0] = sample;
        self.min = self.values.iter().copied().min().unwrap_or(sample);
        self.max = self.values.iter().copied().max().unwrap_or(sample);
    }

    /// Most recent sample
    pub fn latest(&self) -> i32 {
        self.values[0]
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Largest magnitude present in the window
    pub fn max_abs(&self) -> u32 {
        self.min.unsigned_abs().max(self.max.unsigned_abs())
    }

    pub fn values(&self) -> &[i32; MAX_SAMPLE_VALS] {
        &self.values
    }
}
