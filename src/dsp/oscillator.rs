//! Anti-aliased oscillators using PolyBLEP.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A band-limited oscillator with anti-aliasing (PolyBLEP).
///
/// `frequency` is public so a voice can write the modulated pitch into it
/// every sample; `pulse_width` shifts the square wave's duty cycle for
/// PWM (0.5 = symmetric, other waveforms ignore it).
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f64,
    pub pulse_width: f64,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency: 440.0,
            pulse_width: 0.5,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.frequency.max(0.0) / self.sample_rate
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let inc = self.phase_inc();
        let sample = match self.waveform {
            Waveform::Sine => self.sine(),
            Waveform::Sawtooth => self.sawtooth(inc),
            Waveform::Square => self.square(inc),
            Waveform::Triangle => self.triangle(),
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    fn sine(&self) -> f64 {
        (2.0 * PI * self.phase).sin()
    }

    /// Naive sawtooth: rises from -1 to +1, then drops.
    /// PolyBLEP corrects the discontinuity at the wrap.
    fn sawtooth(&self, inc: f64) -> f64 {
        let naive = 2.0 * self.phase - 1.0;
        naive - poly_blep(self.phase, inc)
    }

    /// Square wave via two PolyBLEP-corrected edges; the falling edge sits
    /// at `pulse_width` so PWM can slide it.
    fn square(&self, inc: f64) -> f64 {
        let width = self.pulse_width.clamp(0.05, 0.95);
        let mut value = if self.phase < width { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, inc);
        value -= poly_blep((self.phase + 1.0 - width) % 1.0, inc);
        value
    }

    /// Piecewise-linear triangle: -1→+1 in [0, 0.5], +1→-1 in [0.5, 1].
    fn triangle(&self) -> f64 {
        if self.phase < 0.5 {
            4.0 * self.phase - 1.0
        } else {
            3.0 - 4.0 * self.phase
        }
    }

    /// Reset oscillator phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) anti-aliasing correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
/// Returns a correction value to subtract from the naive waveform
/// at discontinuities.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        // Just after the discontinuity
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        // Just before the next discontinuity
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_zero_at_start() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        osc.frequency = 440.0;
        let sample = osc.next_sample();
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn sine_range() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        osc.frequency = 440.0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s >= -1.0 && s <= 1.0, "Sine out of range: {s}");
        }
    }

    #[test]
    fn sawtooth_range() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 44100.0);
        osc.frequency = 440.0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s >= -1.5 && s <= 1.5, "Saw out of range: {s}");
        }
    }

    #[test]
    fn square_range() {
        let mut osc = Oscillator::new(Waveform::Square, 44100.0);
        osc.frequency = 440.0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s >= -1.5 && s <= 1.5, "Square out of range: {s}");
        }
    }

    #[test]
    fn triangle_range() {
        let mut osc = Oscillator::new(Waveform::Triangle, 44100.0);
        osc.frequency = 440.0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s >= -1.0 && s <= 1.0, "Triangle out of range: {s}");
        }
    }

    #[test]
    fn pulse_width_shifts_duty_cycle() {
        let mut osc = Oscillator::new(Waveform::Square, 44100.0);
        osc.frequency = 100.0;
        osc.pulse_width = 0.25;

        let mut high = 0;
        let mut total = 0;
        for _ in 0..44100 {
            if osc.next_sample() > 0.0 {
                high += 1;
            }
            total += 1;
        }
        let duty = high as f64 / total as f64;
        assert!(
            (duty - 0.25).abs() < 0.02,
            "25% pulse width should give ~25% duty, got {duty}"
        );
    }

    #[test]
    fn frequency_writable_mid_stream() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        osc.frequency = 220.0;
        for _ in 0..100 {
            osc.next_sample();
        }
        osc.frequency = 880.0;
        // Must keep producing finite output after a live retune.
        for _ in 0..100 {
            assert!(osc.next_sample().is_finite());
        }
    }

    #[test]
    fn waveform_serde_names() {
        let json = serde_json::to_string(&Waveform::Sawtooth).unwrap();
        assert_eq!(json, "\"sawtooth\"");
        let back: Waveform = serde_json::from_str("\"square\"").unwrap();
        assert_eq!(back, Waveform::Square);
    }
}
