//! Shared engine state: the sample clock and the modulation-source ledger.
//!
//! Effect stages that run their own modulation source (an LFO, a noise
//! loop, a slicer gate) register it here and get back a [`Teardown`]
//! handle. Releasing the handle stops the source and decrements the
//! ledger, so a leak is directly observable as a nonzero
//! [`EngineContext::running_mod_sources`] count after all voices end.

use std::cell::Cell;
use std::rc::Rc;

/// Engine-wide context handed to every voice and effect chain.
#[derive(Debug, Clone)]
pub struct EngineContext {
    sample_rate: f64,
    clock: Rc<Cell<u64>>,
    mod_sources: Rc<Cell<usize>>,
}

impl EngineContext {
    pub fn new(sample_rate: f64) -> Self {
        EngineContext {
            sample_rate,
            clock: Rc::new(Cell::new(0)),
            mod_sources: Rc::new(Cell::new(0)),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Current engine time in samples.
    pub fn now_samples(&self) -> u64 {
        self.clock.get()
    }

    /// Current engine time in seconds.
    pub fn now_seconds(&self) -> f64 {
        self.clock.get() as f64 / self.sample_rate
    }

    /// Advance the clock by one sample. Called once per output sample.
    pub fn advance(&self) {
        self.clock.set(self.clock.get() + 1);
    }

    pub fn seconds_to_samples(&self, seconds: f64) -> u64 {
        (seconds * self.sample_rate).ceil().max(0.0) as u64
    }

    /// Modulation sources currently running. Zero once every chain built
    /// against this context has released its teardowns.
    pub fn running_mod_sources(&self) -> usize {
        self.mod_sources.get()
    }

    /// Register a running modulation source. The returned handle stops it
    /// exactly once; dropping the handle without releasing it leaks the
    /// source, which the ledger reports.
    pub fn start_mod_source(&self, stop: impl FnOnce() + 'static) -> Teardown {
        self.mod_sources.set(self.mod_sources.get() + 1);
        let ledger = Rc::clone(&self.mod_sources);
        Teardown::new(move || {
            ledger.set(ledger.get().saturating_sub(1));
            stop();
        })
    }
}

/// A take-once cleanup handle for one effect-owned resource.
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Teardown(Some(Box::new(f)))
    }

    /// Run the cleanup. Subsequent calls are no-ops.
    pub fn release(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }

    pub fn is_released(&self) -> bool {
        self.0.is_none()
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Teardown").field(&self.is_released()).finish()
    }
}
