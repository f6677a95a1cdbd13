//! Resonant lowpass stage, the one chain stage the voice LFO can reach.
//!
//! The chain records where this stage sits so the per-voice filter-depth
//! modulation is written into its cutoff every sample.

use crate::config::FilterParams;
use crate::dsp::context::EngineContext;
use crate::dsp::filter::{BiquadFilter, FilterType};

#[derive(Debug, Clone)]
pub struct FilterEffect {
    filter: BiquadFilter,
    base_cutoff: f64,
    last_offset: f64,
}

impl FilterEffect {
    pub fn new(ctx: &EngineContext, params: &FilterParams) -> Self {
        let mut filter = BiquadFilter::new(FilterType::Lowpass, ctx.sample_rate());
        filter.frequency = params.cutoff.max(20.0);
        filter.q = params.resonance.max(0.0001);
        filter.update_coefficients();
        FilterEffect {
            base_cutoff: filter.frequency,
            filter,
            last_offset: 0.0,
        }
    }

    /// Process with an additive cutoff offset in Hz.
    pub fn process_modulated(&mut self, input: f64, cutoff_offset_hz: f64) -> f64 {
        if cutoff_offset_hz != self.last_offset {
            self.filter.set_frequency(self.base_cutoff + cutoff_offset_hz);
            self.last_offset = cutoff_offset_hz;
        }
        self.filter.process(input)
    }

    pub fn process(&mut self, input: f64) -> f64 {
        self.process_modulated(input, 0.0)
    }
}
