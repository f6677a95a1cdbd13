//! Feed-forward dynamics compressor.
//!
//! Threshold, ratio, knee, attack, and release follow the WebAudio
//! DynamicsCompressorNode model. The chain uses it twice: as a hard gate
//! ahead of the distortion saturator and as the limiter inside the reverb
//! tank's feedback loop.

/// A mono dynamics compressor.
#[derive(Debug, Clone)]
pub struct Compressor {
    sample_rate: f64,

    /// Threshold in dB (typical: -50 to 0).
    pub threshold: f64,
    /// Compression ratio (e.g., 4.0 = 4:1 compression).
    pub ratio: f64,
    /// Knee width in dB (0 = hard knee, higher = softer transition).
    pub knee: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Release time in seconds.
    pub release: f64,

    // Current envelope level (linear)
    envelope: f64,
}

impl Compressor {
    pub fn new(
        sample_rate: f64,
        threshold: f64,
        knee: f64,
        ratio: f64,
        attack: f64,
        release: f64,
    ) -> Self {
        Compressor {
            sample_rate,
            threshold: threshold.clamp(-100.0, 0.0),
            ratio: ratio.clamp(1.0, 20.0),
            knee: knee.clamp(0.0, 40.0),
            attack: attack.clamp(0.0001, 1.0),
            release: release.clamp(0.001, 5.0),
            envelope: 0.0,
        }
    }

    /// Convert linear amplitude to dB.
    #[inline]
    fn linear_to_db(linear: f64) -> f64 {
        if linear <= 0.0 {
            -120.0
        } else {
            20.0 * linear.log10()
        }
    }

    /// Convert dB to linear amplitude.
    #[inline]
    fn db_to_linear(db: f64) -> f64 {
        10.0_f64.powf(db / 20.0)
    }

    /// Compute gain reduction in dB for a given input level (in dB).
    #[inline]
    fn compute_gain(&self, input_db: f64) -> f64 {
        let threshold = self.threshold;
        let ratio = self.ratio;
        let knee = self.knee;

        if knee <= 0.0 {
            // Hard knee
            if input_db <= threshold {
                0.0
            } else {
                (threshold - input_db) * (1.0 - 1.0 / ratio)
            }
        } else {
            // Soft knee
            let half_knee = knee / 2.0;
            let knee_start = threshold - half_knee;
            let knee_end = threshold + half_knee;

            if input_db <= knee_start {
                0.0
            } else if input_db >= knee_end {
                (threshold - input_db) * (1.0 - 1.0 / ratio)
            } else {
                // In the knee region - quadratic interpolation
                let x = input_db - knee_start;
                let knee_factor = x / knee;
                -knee_factor * knee_factor * (1.0 - 1.0 / ratio) * half_knee
            }
        }
    }

    /// Process a single sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let input_level = input.abs();

        // Envelope follower (peak detection with attack/release)
        let attack_coef = (-1.0 / (self.attack * self.sample_rate)).exp();
        let release_coef = (-1.0 / (self.release * self.sample_rate)).exp();

        if input_level > self.envelope {
            self.envelope = attack_coef * self.envelope + (1.0 - attack_coef) * input_level;
        } else {
            self.envelope = release_coef * self.envelope + (1.0 - release_coef) * input_level;
        }

        let envelope_db = Self::linear_to_db(self.envelope);
        let gain_reduction_db = self.compute_gain(envelope_db);

        input * Self::db_to_linear(gain_reduction_db)
    }

    /// Reset the compressor state.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
