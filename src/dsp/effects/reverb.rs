//! Reverb: a small two-tap feedback tank.
//!
//! Pre-delayed input feeds two parallel delay taps at mutually prime
//! length ratios. Their sum runs through the decay gain, a damping
//! lowpass, and a limiter before re-entering both taps, so the tail can
//! ring long without the loop ever running away.

use crate::config::ReverbParams;
use crate::dsp::context::EngineContext;
use crate::dsp::delay_line::DelayLine;
use crate::dsp::dynamics::Compressor;
use crate::dsp::filter::{BiquadFilter, FilterType};

const PREDELAY: f64 = 0.010;
const TAP_RATIO_A: f64 = 0.043;
const TAP_RATIO_B: f64 = 0.031;
const DAMP_HZ: f64 = 1500.0;

#[derive(Debug, Clone)]
pub struct Reverb {
    predelay: DelayLine,
    predelay_samples: f64,
    tap_a: DelayLine,
    tap_a_samples: f64,
    tap_b: DelayLine,
    tap_b_samples: f64,
    decay: f64,
    damping: BiquadFilter,
    limiter: Compressor,
    mix: f64,
}

impl Reverb {
    pub fn new(ctx: &EngineContext, params: &ReverbParams) -> Self {
        let sr = ctx.sample_rate();
        let time = params.time.max(0.05);
        let len_a = time * TAP_RATIO_A;
        let len_b = time * TAP_RATIO_B;

        let mut damping = BiquadFilter::new(FilterType::Lowpass, sr);
        damping.frequency = DAMP_HZ;
        damping.update_coefficients();

        Reverb {
            predelay: DelayLine::new(PREDELAY, sr),
            predelay_samples: PREDELAY * sr,
            tap_a: DelayLine::new(len_a, sr),
            tap_a_samples: len_a * sr,
            tap_b: DelayLine::new(len_b, sr),
            tap_b_samples: len_b * sr,
            decay: params.decay.clamp(0.0, 0.95),
            damping,
            limiter: Compressor::new(sr, -3.0, 0.0, 20.0, 0.001, 0.1),
            mix: params.mix.clamp(0.0, 1.0),
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let pre = self.predelay.read(self.predelay_samples);
        self.predelay.write(input);

        let a = self.tap_a.read(self.tap_a_samples);
        let b = self.tap_b.read(self.tap_b_samples);
        let wet = a + b;

        let feedback = self.limiter.process(self.damping.process(wet * self.decay));
        self.tap_a.write(pre + feedback);
        self.tap_b.write(pre + feedback);

        input * (1.0 - self.mix) + wet * self.mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EngineContext {
        EngineContext::new(44100.0)
    }

    #[test]
    fn impulse_grows_a_tail() {
        let params = ReverbParams { mix: 1.0, decay: 0.7, time: 1.0 };
        let mut rv = Reverb::new(&ctx(), &params);

        rv.process(1.0);
        let mut energy_early = 0.0;
        let mut energy_late = 0.0;
        for i in 1..22050 {
            let out = rv.process(0.0).abs();
            if i < 4410 {
                energy_early += out;
            } else if i < 8820 {
                energy_late += out;
            }
        }
        assert!(energy_early > 0.0, "tank should produce early reflections");
        assert!(energy_late > 0.0, "tail should persist past 100ms");
    }

    #[test]
    fn tail_decays_to_silence() {
        let params = ReverbParams { mix: 1.0, decay: 0.5, time: 0.5 };
        let mut rv = Reverb::new(&ctx(), &params);

        rv.process(1.0);
        for _ in 0..44100 {
            rv.process(0.0);
        }
        let late: f64 = (0..4410).map(|_| rv.process(0.0).abs()).sum();
        assert!(late < 0.01, "tail should have decayed after 1s, got {late}");
    }

    #[test]
    fn loop_never_runs_away() {
        // Max decay with sustained loud input; the limiter holds the loop.
        let params = ReverbParams { mix: 1.0, decay: 0.95, time: 2.0 };
        let mut rv = Reverb::new(&ctx(), &params);

        let mut peak = 0.0_f64;
        for i in 0..88200 {
            let t = i as f64 / 44100.0;
            let out = rv.process((2.0 * std::f64::consts::PI * 220.0 * t).sin());
            assert!(out.is_finite(), "tank diverged at sample {i}");
            peak = peak.max(out.abs());
        }
        assert!(peak < 10.0, "limited tank should stay bounded, got {peak}");
    }

    #[test]
    fn dry_mix_passes_input() {
        let params = ReverbParams { mix: 0.0, decay: 0.6, time: 1.0 };
        let mut rv = Reverb::new(&ctx(), &params);
        assert!((rv.process(0.42) - 0.42).abs() < 1e-12);
    }
}
