//! Lo-fi: muffled bandwidth and tape saturation, with optional hiss.

use std::cell::Cell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::LofiParams;
use crate::dsp::context::{EngineContext, Teardown};
use crate::dsp::filter::{BiquadFilter, FilterType};

const MUFFLE_Q: f64 = 0.7;
const HISS_LOWPASS_HZ: f64 = 5000.0;

/// Looping white-noise source behind a lowpass, mixed in at the hiss
/// level. Runs until its teardown fires.
#[derive(Debug)]
struct HissSource {
    rng: SmallRng,
    filter: BiquadFilter,
    gain: f64,
    running: Rc<Cell<bool>>,
}

impl HissSource {
    fn next_sample(&mut self) -> f64 {
        if !self.running.get() {
            return 0.0;
        }
        let white: f64 = self.rng.gen_range(-1.0..1.0);
        self.filter.process(white) * self.gain
    }
}

#[derive(Debug)]
pub struct Lofi {
    muffle_a: BiquadFilter,
    muffle_b: BiquadFilter,
    hiss: Option<HissSource>,
}

impl Lofi {
    pub fn new(ctx: &EngineContext, params: &LofiParams) -> (Self, Option<Teardown>) {
        let sr = ctx.sample_rate();

        let mut muffle_a = BiquadFilter::new(FilterType::Lowpass, sr);
        muffle_a.frequency = params.muffle_hz.max(20.0);
        muffle_a.q = MUFFLE_Q;
        muffle_a.update_coefficients();
        let muffle_b = muffle_a.clone();

        let (hiss, teardown) = if params.hiss > 0.0 {
            let running = Rc::new(Cell::new(true));
            let flag = Rc::clone(&running);
            let teardown = ctx.start_mod_source(move || flag.set(false));

            let mut hiss_filter = BiquadFilter::new(FilterType::Lowpass, sr);
            hiss_filter.frequency = HISS_LOWPASS_HZ;
            hiss_filter.update_coefficients();

            let source = HissSource {
                rng: SmallRng::seed_from_u64(ctx.now_samples() ^ 0x10f1),
                filter: hiss_filter,
                gain: params.hiss,
                running,
            };
            (Some(source), Some(teardown))
        } else {
            (None, None)
        };

        let stage = Lofi { muffle_a, muffle_b, hiss };
        (stage, teardown)
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let muffled = self.muffle_b.process(self.muffle_a.process(input));
        let saturated = (muffled * 2.5).tanh();
        match &mut self.hiss {
            Some(hiss) => saturated + hiss.next_sample(),
            None => saturated,
        }
    }
}
