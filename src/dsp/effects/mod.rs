//! Per-note effect chain.
//!
//! Every voice gets its own chain, built once from a snapshot of the
//! effect settings. Stages run in a fixed order regardless of which are
//! enabled, and a makeup gain ahead of the chain drives the stages to
//! compensate for the level each enabled stage eats.

pub mod bitcrusher;
pub mod delay;
pub mod distortion;
pub mod filter;
pub mod flanger;
pub mod lofi;
pub mod reverb;
pub mod slicer;
pub mod unyounyo;

use std::fmt;

use crate::config::EffectSettings;
use crate::dsp::context::{EngineContext, Teardown};
use crate::error::EngineError;

pub use bitcrusher::Bitcrusher;
pub use delay::Delay;
pub use distortion::Distortion;
pub use filter::FilterEffect;
pub use flanger::Flanger;
pub use lofi::Lofi;
pub use reverb::Reverb;
pub use slicer::Slicer;
pub use unyounyo::Unyounyo;

/// The nine chain stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectId {
    Distortion,
    Bitcrusher,
    Lofi,
    Filter,
    Slicer,
    Unyounyo,
    Flanger,
    Delay,
    Reverb,
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectId::Distortion => "distortion",
            EffectId::Bitcrusher => "bitcrusher",
            EffectId::Lofi => "lofi",
            EffectId::Filter => "filter",
            EffectId::Slicer => "slicer",
            EffectId::Unyounyo => "unyounyo",
            EffectId::Flanger => "flanger",
            EffectId::Delay => "delay",
            EffectId::Reverb => "reverb",
        };
        f.write_str(name)
    }
}

/// Chain order, saturation first and time effects last.
pub const CHAIN_ORDER: [EffectId; 9] = [
    EffectId::Distortion,
    EffectId::Bitcrusher,
    EffectId::Lofi,
    EffectId::Filter,
    EffectId::Slicer,
    EffectId::Unyounyo,
    EffectId::Flanger,
    EffectId::Delay,
    EffectId::Reverb,
];

/// Per-stage makeup gain: `1 + 0.1 * enabled`, applied only when at least
/// one stage is enabled.
fn makeup_gain(enabled: usize) -> f64 {
    if enabled == 0 {
        1.0
    } else {
        1.0 + 0.1 * enabled as f64
    }
}

#[derive(Debug)]
enum EffectStage {
    Distortion(Distortion),
    Bitcrusher(Bitcrusher),
    Lofi(Lofi),
    Filter(FilterEffect),
    Slicer(Slicer),
    Unyounyo(Unyounyo),
    Flanger(Flanger),
    Delay(Delay),
    Reverb(Reverb),
}

impl EffectStage {
    fn process(&mut self, input: f64) -> f64 {
        match self {
            EffectStage::Distortion(s) => s.process(input),
            EffectStage::Bitcrusher(s) => s.process(input),
            EffectStage::Lofi(s) => s.process(input),
            EffectStage::Filter(s) => s.process(input),
            EffectStage::Slicer(s) => s.process(input),
            EffectStage::Unyounyo(s) => s.process(input),
            EffectStage::Flanger(s) => s.process(input),
            EffectStage::Delay(s) => s.process(input),
            EffectStage::Reverb(s) => s.process(input),
        }
    }
}

/// A voice's built effect chain plus the teardowns for every modulation
/// source its stages own.
#[derive(Debug)]
pub struct EffectChain {
    stages: Vec<EffectStage>,
    /// Index of the filter stage, if enabled, for external cutoff
    /// modulation.
    filter_stage: Option<usize>,
    makeup_gain: f64,
    teardowns: Vec<Teardown>,
    released: bool,
}

impl EffectChain {
    /// Build a chain from a settings snapshot. Fails without leaking: any
    /// teardowns registered before the failing stage are released.
    pub fn build(
        ctx: &EngineContext,
        fx: &EffectSettings,
        bpm: f64,
    ) -> Result<Self, EngineError> {
        let mut chain = EffectChain {
            stages: Vec::new(),
            filter_stage: None,
            makeup_gain: makeup_gain(fx.enabled_count()),
            teardowns: Vec::new(),
            released: false,
        };

        for id in CHAIN_ORDER {
            if let Err(e) = chain.push_stage(ctx, fx, bpm, id) {
                chain.release_teardowns();
                return Err(e);
            }
        }
        Ok(chain)
    }

    fn push_stage(
        &mut self,
        ctx: &EngineContext,
        fx: &EffectSettings,
        bpm: f64,
        id: EffectId,
    ) -> Result<(), EngineError> {
        match id {
            EffectId::Distortion if fx.distortion_on => {
                self.stages
                    .push(EffectStage::Distortion(Distortion::new(ctx, &fx.distortion)));
            }
            EffectId::Bitcrusher if fx.bitcrusher_on => {
                let (stage, teardown) = Bitcrusher::new(ctx, &fx.bitcrusher);
                self.stages.push(EffectStage::Bitcrusher(stage));
                self.teardowns.extend(teardown);
            }
            EffectId::Lofi if fx.lofi_on => {
                let (stage, teardown) = Lofi::new(ctx, &fx.lofi);
                self.stages.push(EffectStage::Lofi(stage));
                self.teardowns.extend(teardown);
            }
            EffectId::Filter if fx.filter_on => {
                self.filter_stage = Some(self.stages.len());
                self.stages
                    .push(EffectStage::Filter(FilterEffect::new(ctx, &fx.filter)));
            }
            EffectId::Slicer if fx.slicer_on => {
                let (stage, teardown) = Slicer::new(ctx, &fx.slicer, bpm)?;
                self.stages.push(EffectStage::Slicer(stage));
                self.teardowns.push(teardown);
            }
            EffectId::Unyounyo if fx.unyounyo_on => {
                let (stage, teardown) = Unyounyo::new(ctx, &fx.unyounyo);
                self.stages.push(EffectStage::Unyounyo(stage));
                self.teardowns.push(teardown);
            }
            EffectId::Flanger if fx.flanger_on => {
                let (stage, teardown) = Flanger::new(ctx, &fx.flanger, bpm);
                self.stages.push(EffectStage::Flanger(stage));
                self.teardowns.push(teardown);
            }
            EffectId::Delay if fx.delay_on => {
                self.stages.push(EffectStage::Delay(Delay::new(ctx, &fx.delay, bpm)?));
            }
            EffectId::Reverb if fx.reverb_on => {
                self.stages.push(EffectStage::Reverb(Reverb::new(ctx, &fx.reverb)));
            }
            _ => {}
        }
        Ok(())
    }

    /// Run one sample through every stage. `filter_mod_hz` is added to the
    /// filter stage's cutoff when that stage exists. The makeup gain sits
    /// in front, so it drives the nonlinear stages rather than scaling
    /// their output.
    pub fn process(&mut self, input: f64, filter_mod_hz: f64) -> f64 {
        let mut signal = input * self.makeup_gain;
        for (i, stage) in self.stages.iter_mut().enumerate() {
            signal = match stage {
                EffectStage::Filter(f) if Some(i) == self.filter_stage => {
                    f.process_modulated(signal, filter_mod_hz)
                }
                other => other.process(signal),
            };
        }
        signal
    }

    /// Stop every modulation source the chain owns. Safe to call more
    /// than once.
    pub fn release_teardowns(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for td in &mut self.teardowns {
            td.release();
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn teardown_count(&self) -> usize {
        self.teardowns.len()
    }
}
