//! Slicer: a tempo-synced on/off gate.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::SlicerParams;
use crate::dsp::context::{EngineContext, Teardown};
use crate::error::EngineError;
use crate::timing::duration_seconds;

use super::EffectId;

#[derive(Debug, Clone)]
pub struct Slicer {
    half_period_samples: u64,
    counter: u64,
    gate_open: bool,
    mix: f64,
    running: Rc<Cell<bool>>,
}

impl Slicer {
    pub fn new(
        ctx: &EngineContext,
        params: &SlicerParams,
        bpm: f64,
    ) -> Result<(Self, Teardown), EngineError> {
        let duration = duration_seconds(&params.rate_note, bpm);
        if duration <= 0.0 {
            return Err(EngineError::InvalidEffectConfig {
                effect: EffectId::Slicer,
                reason: format!(
                    "rate {:?} at {bpm} BPM gives no usable gate period",
                    params.rate_note
                ),
            });
        }

        let running = Rc::new(Cell::new(true));
        let flag = Rc::clone(&running);
        let teardown = ctx.start_mod_source(move || flag.set(false));

        let stage = Slicer {
            half_period_samples: ctx.seconds_to_samples(duration / 2.0).max(1),
            counter: 0,
            gate_open: true,
            mix: params.mix.clamp(0.0, 1.0),
            running,
        };
        Ok((stage, teardown))
    }

    pub fn process(&mut self, input: f64) -> f64 {
        // A stopped gate timer freezes in its current position.
        if self.running.get() {
            self.counter += 1;
            if self.counter >= self.half_period_samples {
                self.counter = 0;
                self.gate_open = !self.gate_open;
            }
        }
        let gated = if self.gate_open { input } else { 0.0 };
        input * (1.0 - self.mix) + gated * self.mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EngineContext {
        EngineContext::new(1000.0)
    }

    #[test]
    fn rejects_unusable_rate() {
        let params = SlicerParams { rate_note: "??".to_string(), mix: 1.0 };
        let err = Slicer::new(&ctx(), &params, 120.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidEffectConfig { .. }));
        assert!(err.to_string().contains("slicer"));
    }

    #[test]
    fn zero_bpm_is_rejected() {
        let params = SlicerParams::default();
        assert!(Slicer::new(&ctx(), &params, 0.0).is_err());
    }

    #[test]
    fn gate_chops_signal_in_half_periods() {
        let ctx = ctx();
        // "4" at 60 BPM = 1s; half period = 500 samples at 1kHz.
        let params = SlicerParams { rate_note: "4".to_string(), mix: 1.0 };
        let (mut slicer, _td) = Slicer::new(&ctx, &params, 60.0).unwrap();

        let out: Vec<f64> = (0..2000).map(|_| slicer.process(1.0)).collect();
        // First window open, second closed, third open again.
        assert!(out[..499].iter().all(|&s| s == 1.0));
        assert!(out[520..990].iter().all(|&s| s == 0.0));
        assert!(out[1020..1490].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn mix_keeps_dry_floor() {
        let ctx = ctx();
        let params = SlicerParams { rate_note: "4".to_string(), mix: 0.5 };
        let (mut slicer, _td) = Slicer::new(&ctx, &params, 60.0).unwrap();

        // Skip to a closed window; half the dry signal remains.
        for _ in 0..600 {
            slicer.process(1.0);
        }
        let out = slicer.process(1.0);
        assert!((out - 0.5).abs() < 1e-12, "closed gate at mix 0.5 should give 0.5, got {out}");
    }

    #[test]
    fn teardown_freezes_gate() {
        let ctx = ctx();
        let params = SlicerParams { rate_note: "4".to_string(), mix: 1.0 };
        let (mut slicer, mut td) = Slicer::new(&ctx, &params, 60.0).unwrap();
        assert_eq!(ctx.running_mod_sources(), 1);

        td.release();
        assert_eq!(ctx.running_mod_sources(), 0);
        // Gate started open and can no longer toggle.
        for _ in 0..5000 {
            assert_eq!(slicer.process(1.0), 1.0);
        }
    }
}
