//! Low-frequency oscillators and the per-voice modulation bank.

use std::cell::Cell;
use std::f64::consts::PI;
use std::rc::Rc;

use crate::config::LfoConfig;

/// A sine LFO with an external kill switch.
///
/// The `running` flag is shared with the teardown that stops this LFO; a
/// stopped LFO outputs 0 so anything still holding the stage hears the
/// modulation vanish rather than freeze.
#[derive(Debug, Clone)]
pub struct Lfo {
    rate: f64,
    phase: f64,
    sample_rate: f64,
    running: Rc<Cell<bool>>,
}

impl Lfo {
    pub fn new(rate: f64, sample_rate: f64) -> Self {
        Lfo {
            rate: rate.max(0.0),
            phase: 0.0,
            sample_rate,
            running: Rc::new(Cell::new(true)),
        }
    }

    /// Shared flag a teardown can clear to stop this LFO.
    pub fn running_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.running)
    }

    pub fn next_sample(&mut self) -> f64 {
        if !self.running.get() {
            return 0.0;
        }
        let out = (2.0 * PI * self.phase).sin();
        self.phase = (self.phase + self.rate / self.sample_rate) % 1.0;
        out
    }
}

/// PWM sub-oscillator rate in Hz.
const PWM_RATE: f64 = 6.0;

/// One LFO fanned into three destinations through independent depths,
/// plus an optional fixed-rate PWM sub-oscillator. This mirrors a single
/// modulation oscillator wired through three gain taps.
#[derive(Debug, Clone)]
pub struct LfoBank {
    lfo: Lfo,
    pitch_depth: f64,
    filter_depth: f64,
    amp_depth: f64,
    pwm: Option<Lfo>,
    pwm_depth: f64,
}

/// One sample of the bank's three outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modulation {
    /// Pitch offset in Hz.
    pub pitch_hz: f64,
    /// Filter-cutoff offset in Hz.
    pub filter_hz: f64,
    /// Amplitude offset added to the envelope gain.
    pub amp: f64,
    /// Pulse-width offset around the 0.5 center.
    pub pulse_width: f64,
}

impl LfoBank {
    /// `pwm_depth` > 0 attaches the 6 Hz pulse-width sub-oscillator; its
    /// gain is the slider value times 10, same scaling as the UI applies.
    pub fn new(config: &LfoConfig, pwm_depth: f64, sample_rate: f64) -> Self {
        let pwm = if pwm_depth > 0.0 {
            Some(Lfo::new(PWM_RATE, sample_rate))
        } else {
            None
        };
        LfoBank {
            lfo: Lfo::new(config.rate, sample_rate),
            pitch_depth: config.pitch_depth,
            filter_depth: config.filter_depth,
            amp_depth: config.amp_depth,
            pwm,
            pwm_depth: pwm_depth * 10.0,
        }
    }

    pub fn running_flag(&self) -> Rc<Cell<bool>> {
        self.lfo.running_flag()
    }

    pub fn pwm_running_flag(&self) -> Option<Rc<Cell<bool>>> {
        self.pwm.as_ref().map(Lfo::running_flag)
    }

    pub fn next_sample(&mut self) -> Modulation {
        let v = self.lfo.next_sample();
        let pulse_width = match &mut self.pwm {
            // Scaled into duty-cycle space; the oscillator clamps.
            Some(pwm) => pwm.next_sample() * self.pwm_depth * 0.01,
            None => 0.0,
        };
        Modulation {
            pitch_hz: v * self.pitch_depth,
            filter_hz: v * self.filter_depth,
            amp: v * self.amp_depth,
            pulse_width,
        }
    }
}
