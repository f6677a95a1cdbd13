//! Flanger: a tempo-synced swept short delay.

use crate::config::FlangerParams;
use crate::dsp::context::{EngineContext, Teardown};
use crate::dsp::delay_line::DelayLine;
use crate::dsp::lfo::Lfo;
use crate::timing::frequency_hz;

/// Center of the swept delay, in seconds.
const BASE_DELAY: f64 = 0.005;

#[derive(Debug, Clone)]
pub struct Flanger {
    line: DelayLine,
    lfo: Lfo,
    depth: f64,
    mix: f64,
    sample_rate: f64,
}

impl Flanger {
    pub fn new(ctx: &EngineContext, params: &FlangerParams, bpm: f64) -> (Self, Teardown) {
        let rate = frequency_hz(&params.rate_note, bpm);
        let lfo = Lfo::new(rate, ctx.sample_rate());

        let flag = lfo.running_flag();
        let teardown = ctx.start_mod_source(move || flag.set(false));

        let depth = params.depth.clamp(0.0, BASE_DELAY * 0.9);
        let stage = Flanger {
            line: DelayLine::new(BASE_DELAY * 2.0, ctx.sample_rate()),
            lfo,
            depth,
            mix: params.mix.clamp(0.0, 1.0),
            sample_rate: ctx.sample_rate(),
        };
        (stage, teardown)
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let sweep = self.lfo.next_sample() * self.depth;
        let delay_samples = (BASE_DELAY + sweep) * self.sample_rate;
        let wet = self.line.read(delay_samples);
        self.line.write(input);
        input * (1.0 - self.mix) + wet * self.mix
    }
}
