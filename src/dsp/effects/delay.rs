//! Tempo-synced feedback delay.

use crate::config::DelayParams;
use crate::dsp::context::EngineContext;
use crate::dsp::delay_line::DelayLine;
use crate::error::EngineError;
use crate::timing::duration_seconds;

use super::EffectId;

#[derive(Debug, Clone)]
pub struct Delay {
    line: DelayLine,
    delay_samples: f64,
    feedback: f64,
    mix: f64,
}

impl Delay {
    pub fn new(ctx: &EngineContext, params: &DelayParams, bpm: f64) -> Result<Self, EngineError> {
        let time = duration_seconds(&params.time_note, bpm);
        if time <= 0.0 {
            return Err(EngineError::InvalidEffectConfig {
                effect: EffectId::Delay,
                reason: format!(
                    "time {:?} at {bpm} BPM gives no usable delay time",
                    params.time_note
                ),
            });
        }

        Ok(Delay {
            line: DelayLine::new(time, ctx.sample_rate()),
            delay_samples: time * ctx.sample_rate(),
            feedback: params.feedback.clamp(0.0, 0.95),
            mix: params.mix.clamp(0.0, 1.0),
        })
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let delayed = self.line.read(self.delay_samples);
        self.line.write(input + delayed * self.feedback);
        input * (1.0 - self.mix) + delayed * self.mix
    }
}
