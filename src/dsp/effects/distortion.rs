//! Distortion: a gated waveshaper with mid scoop and treble shelf.

use crate::config::DistortionParams;
use crate::dsp::context::EngineContext;
use crate::dsp::dynamics::Compressor;
use crate::dsp::filter::{BiquadFilter, FilterType};

const TREBLE_SHELF_HZ: f64 = 3500.0;
const MID_Q: f64 = 1.5;

/// Noise gate ahead of the saturator so silence between notes does not
/// turn into amplified hiss.
fn make_gate(sample_rate: f64) -> Compressor {
    Compressor::new(sample_rate, -50.0, 0.0, 20.0, 0.005, 0.1)
}

#[derive(Debug, Clone)]
pub struct Distortion {
    gate: Compressor,
    pre_gain: f64,
    mid: BiquadFilter,
    treble: BiquadFilter,
}

impl Distortion {
    pub fn new(ctx: &EngineContext, params: &DistortionParams) -> Self {
        let sr = ctx.sample_rate();

        let mut mid = BiquadFilter::new(FilterType::Peaking, sr);
        mid.frequency = params.mid_freq.max(20.0);
        mid.q = MID_Q;
        mid.gain_db = params.mid_cut_db;
        mid.update_coefficients();

        let mut treble = BiquadFilter::new(FilterType::Highshelf, sr);
        treble.frequency = TREBLE_SHELF_HZ;
        treble.gain_db = params.treble_db;
        treble.update_coefficients();

        Distortion {
            gate: make_gate(sr),
            pre_gain: params.gain.max(0.0),
            mid,
            treble,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let gated = self.gate.process(input);
        let shaped = (gated * self.pre_gain * 3.0).tanh();
        let scooped = self.mid.process(shaped);
        self.treble.process(scooped)
    }
}
