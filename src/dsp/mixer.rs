//! Master output stage: gain and soft clipping.

/// Applies the master volume and keeps the summed voice/pad bus inside
/// [-1, 1] with a tanh soft clipper.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
}

impl Mixer {
    pub fn new() -> Self {
        Mixer { master_gain: 1.0 }
    }

    /// Mix one summed bus sample down to the output.
    #[inline]
    pub fn process(&self, sample: f64) -> f64 {
        soft_clip(sample * self.master_gain)
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Mixer::new()
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
pub fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
