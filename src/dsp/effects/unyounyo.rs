//! Unyounyo: a seasick pitch-wobble.
//!
//! A feedback delay whose time is nudged by a slow LFO. The wobble rate
//! scales with how far the pitch knob sits from its neutral position.

use crate::config::UnyounyoParams;
use crate::dsp::context::{EngineContext, Teardown};
use crate::dsp::delay_line::DelayLine;
use crate::dsp::lfo::Lfo;

const BASE_DELAY: f64 = 0.1;
const FEEDBACK: f64 = 0.75;
const LFO_GAIN: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct Unyounyo {
    line: DelayLine,
    lfo: Lfo,
    mix: f64,
    sample_rate: f64,
}

impl Unyounyo {
    pub fn new(ctx: &EngineContext, params: &UnyounyoParams) -> (Self, Teardown) {
        // pitch = 1.0 is dead center: no wobble.
        let rate = (params.pitch - 1.0).abs() * 10.0;
        let lfo = Lfo::new(rate, ctx.sample_rate());

        let flag = lfo.running_flag();
        let teardown = ctx.start_mod_source(move || flag.set(false));

        let stage = Unyounyo {
            line: DelayLine::new(BASE_DELAY + LFO_GAIN + 0.01, ctx.sample_rate()),
            lfo,
            mix: params.mix.clamp(0.0, 1.0),
            sample_rate: ctx.sample_rate(),
        };
        (stage, teardown)
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let wobble = self.lfo.next_sample() * LFO_GAIN;
        let delay_samples = (BASE_DELAY + wobble) * self.sample_rate;
        let wet = self.line.read(delay_samples);
        self.line.write(input + wet * FEEDBACK);
        input * (1.0 - self.mix) + wet * self.mix
    }
}
