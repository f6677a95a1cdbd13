//! Bitcrusher: amplitude quantization plus sample-rate reduction.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::BitcrusherParams;
use crate::dsp::context::{EngineContext, Teardown};

/// Bit depths at or above this leave the signal untouched; the builder
/// returns a passthrough stage with no processor attached.
pub const PASSTHROUGH_DEPTH: u32 = 24;

#[derive(Debug, Clone)]
pub struct Bitcrusher {
    /// Quantization levels, `2^depth - 1`.
    levels: f64,
    rate_divide: u32,
    counter: u32,
    held: f64,
    passthrough: bool,
    running: Rc<Cell<bool>>,
}

impl Bitcrusher {
    /// Returns the stage and, when a processor is actually attached, the
    /// teardown that detaches it.
    pub fn new(ctx: &EngineContext, params: &BitcrusherParams) -> (Self, Option<Teardown>) {
        if params.depth >= PASSTHROUGH_DEPTH {
            let stage = Bitcrusher {
                levels: 1.0,
                rate_divide: 1,
                counter: 0,
                held: 0.0,
                passthrough: true,
                running: Rc::new(Cell::new(true)),
            };
            return (stage, None);
        }

        let running = Rc::new(Cell::new(true));
        let flag = Rc::clone(&running);
        let teardown = ctx.start_mod_source(move || flag.set(false));

        let stage = Bitcrusher {
            levels: 2.0_f64.powi(params.depth.max(1) as i32) - 1.0,
            rate_divide: params.rate_divide.max(1),
            counter: 0,
            held: 0.0,
            passthrough: false,
            running,
        };
        (stage, Some(teardown))
    }

    pub fn process(&mut self, input: f64) -> f64 {
        // A detached processor no longer shapes the signal.
        if self.passthrough || !self.running.get() {
            return input;
        }
        if self.counter == 0 {
            self.held = (input * self.levels).round() / self.levels;
        }
        self.counter = (self.counter + 1) % self.rate_divide;
        self.held
    }
}
