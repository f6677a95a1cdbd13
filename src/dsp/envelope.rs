//! Amplitude envelope generator.
//!
//! Attack is linear to full scale; decay and release are one-pole
//! exponential approaches, which is what scheduled `setTargetAtTime`-style
//! automation sounds like. The decay time constant gets a +0.01 s floor so
//! a zero decay setting still converges smoothly, and release uses a fifth
//! of the release time as its constant so the tail is effectively silent
//! by the time the release window ends.

use crate::config::EnvelopeConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    DecaySustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,

    stage: Stage,
    level: f64,
    sample_rate: f64,
    attack_samples: usize,
    attack_counter: usize,
    attack_start: f64,
}

impl Envelope {
    pub fn new(config: &EnvelopeConfig, sample_rate: f64) -> Self {
        Envelope {
            attack: config.attack.max(0.0),
            decay: config.decay.max(0.0),
            sustain: config.sustain.clamp(0.0, 1.0),
            release: config.release.max(0.0),
            stage: Stage::Idle,
            level: 0.0,
            sample_rate,
            attack_samples: 0,
            attack_counter: 0,
            attack_start: 0.0,
        }
    }

    /// Trigger the envelope (note on).
    pub fn gate_on(&mut self) {
        self.stage = Stage::Attack;
        self.attack_samples = (self.attack * self.sample_rate) as usize;
        self.attack_counter = 0;
        self.attack_start = self.level; // retrigger from current level
    }

    /// Release the envelope (note off).
    pub fn gate_off(&mut self) {
        if self.stage == Stage::Idle {
            return;
        }
        self.stage = Stage::Release;
    }

    /// One-pole coefficient for an exponential approach with the given
    /// time constant.
    fn approach_coef(&self, time_constant: f64) -> f64 {
        1.0 - (-1.0 / (time_constant * self.sample_rate)).exp()
    }

    /// Generate the next envelope sample [0, 1].
    pub fn next_sample(&mut self) -> f64 {
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                if self.attack_samples == 0 {
                    self.level = 1.0;
                    self.stage = Stage::DecaySustain;
                } else {
                    let t = self.attack_counter as f64 / self.attack_samples as f64;
                    self.level = self.attack_start + (1.0 - self.attack_start) * t;
                    self.attack_counter += 1;
                    if self.attack_counter >= self.attack_samples {
                        self.level = 1.0;
                        self.stage = Stage::DecaySustain;
                    }
                }
            }
            Stage::DecaySustain => {
                let coef = self.approach_coef(self.decay + 0.01);
                self.level += (self.sustain - self.level) * coef;
            }
            Stage::Release => {
                let tc = (self.release / 5.0).max(1e-4);
                let coef = self.approach_coef(tc);
                self.level += (0.0 - self.level) * coef;
                if self.level < 1e-5 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }

    /// Returns true once the release tail has fully decayed.
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Idle
    }
}
