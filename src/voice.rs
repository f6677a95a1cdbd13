//! A single sounding note: oscillator, envelope, modulation, effect chain.

use crate::config::SynthConfig;
use crate::dsp::context::EngineContext;
use crate::dsp::effects::EffectChain;
use crate::dsp::envelope::Envelope;
use crate::dsp::lfo::LfoBank;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::error::EngineError;
use crate::note::Note;

pub struct Voice {
    oscillator: Oscillator,
    base_frequency: f64,
    envelope: Envelope,
    lfo: LfoBank,
    chain: EffectChain,
    release_seconds: f64,
    releasing: bool,
}

impl Voice {
    /// Build a voice for `note` from a snapshot of the current config.
    /// Fails (without leaking modulation sources) if the effect chain
    /// rejects its settings.
    pub fn new(ctx: &EngineContext, note: Note, config: &SynthConfig) -> Result<Self, EngineError> {
        let chain = EffectChain::build(ctx, &config.effects, config.bpm)?;

        let mut oscillator = Oscillator::new(config.waveform, ctx.sample_rate());
        oscillator.frequency = note.frequency();

        let mut envelope = Envelope::new(&config.envelope, ctx.sample_rate());
        envelope.gate_on();

        // The PWM sub-oscillator only applies to square waves.
        let pwm_depth = match config.waveform {
            Waveform::Square => config.pwm_depth.max(0.0),
            _ => 0.0,
        };

        Ok(Voice {
            base_frequency: note.frequency(),
            oscillator,
            envelope,
            lfo: LfoBank::new(&config.lfo, pwm_depth, ctx.sample_rate()),
            chain,
            release_seconds: config.envelope.release.max(0.0),
            releasing: false,
        })
    }

    /// One output sample: modulated oscillator, envelope gain, chain.
    pub fn next_sample(&mut self) -> f64 {
        let m = self.lfo.next_sample();
        self.oscillator.frequency = (self.base_frequency + m.pitch_hz).max(0.0);
        self.oscillator.pulse_width = 0.5 + m.pulse_width;

        let gain = (self.envelope.next_sample() + m.amp).max(0.0);
        let raw = self.oscillator.next_sample() * gain;
        self.chain.process(raw, m.filter_hz)
    }

    /// Start the release phase and stop the chain's modulation sources.
    /// A second call is a no-op so teardowns never double-fire.
    pub fn release(&mut self) {
        if self.releasing {
            return;
        }
        self.releasing = true;
        self.envelope.gate_off();
        self.chain.release_teardowns();
    }

    pub fn is_releasing(&self) -> bool {
        self.releasing
    }

    /// How long the release tail lasts before the voice can be dropped.
    pub fn release_seconds(&self) -> f64 {
        self.release_seconds
    }

    /// The voice's own LFO and PWM oscillators run for the life of the
    /// voice; they die with it, so only the chain registers teardowns.
    pub fn chain_teardown_count(&self) -> usize {
        self.chain.teardown_count()
    }
}
