//! The top-level engine: keyboard, pads, and the master output stage.
//!
//! Control events (key and pad presses) never return errors to the
//! caller; a failed trigger is logged and dropped so everything already
//! sounding keeps sounding.

use crate::config::SynthConfig;
use crate::dsp::context::EngineContext;
use crate::dsp::mixer::Mixer;
use crate::note::{Note, PitchClass};
use crate::pads::{SampleBuffer, SamplePadEngine};
use crate::voice_manager::VoiceManager;

pub struct Synth {
    ctx: EngineContext,
    config: SynthConfig,
    voices: VoiceManager,
    pads: SamplePadEngine,
    mixer: Mixer,
}

impl Synth {
    pub fn new(sample_rate: f64) -> Self {
        let ctx = EngineContext::new(sample_rate);
        let pads = SamplePadEngine::new(&ctx);
        let mut synth = Synth {
            ctx,
            config: SynthConfig::default(),
            voices: VoiceManager::new(),
            pads,
            mixer: Mixer::new(),
        };
        synth.sync_from_config();
        synth
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Replace the whole config (a control-panel snapshot). Derived state
    /// (scale filter, pad tuning, master gain) follows immediately; voices
    /// already sounding keep their snapshots.
    pub fn set_config(&mut self, config: SynthConfig) {
        self.config = config;
        self.sync_from_config();
    }

    fn sync_from_config(&mut self) {
        self.voices.scale_filter.set_root(self.config.scale_root);
        self.voices.scale_filter.set_active(self.config.scale_lock);
        self.pads.set_pitch_shift(self.config.pitch_shift);
        self.mixer.master_gain = self.config.master_volume;
    }

    pub fn set_scale_lock(&mut self, active: bool) {
        self.config.scale_lock = active;
        self.voices.scale_filter.set_active(active);
    }

    pub fn set_scale_root(&mut self, root: PitchClass) {
        self.config.scale_root = root;
        self.voices.scale_filter.set_root(root);
    }

    pub fn set_pitch_shift(&mut self, semitones: i32) {
        self.config.pitch_shift = semitones;
        self.pads.set_pitch_shift(semitones);
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.config.master_volume = volume.max(0.0);
        self.mixer.master_gain = self.config.master_volume;
    }

    /// Key pressed. Errors are logged, never propagated.
    pub fn key_down(&mut self, note: Note) {
        if let Err(e) = self.voices.note_on(&self.ctx, note, &self.config) {
            log::warn!("note {note} dropped: {e}");
        }
    }

    /// Key released.
    pub fn key_up(&mut self, note: Note) {
        self.voices.note_off(&self.ctx, note);
    }

    /// Pad pressed. Errors are logged, never propagated.
    pub fn pad_down(&mut self, index: usize) {
        if let Err(e) = self.pads.trigger(index, &self.config) {
            log::warn!("pad {index} dropped: {e}");
        }
    }

    pub fn pads(&self) -> &SamplePadEngine {
        &self.pads
    }

    pub fn pads_mut(&mut self) -> &mut SamplePadEngine {
        &mut self.pads
    }

    pub fn active_voices(&self) -> usize {
        self.voices.active_voices()
    }

    /// Render into an output buffer, one mono sample per slot.
    pub fn render(&mut self, output: &mut [f64]) {
        for slot in output.iter_mut() {
            self.voices.dispatch_removals(&self.ctx);
            let bus = self.voices.next_sample() + self.pads.next_sample();
            *slot = self.mixer.process(bus);
            self.ctx.advance();
        }
    }

    /// Forget session-local state when the signed-in user changes: pads
    /// are emptied and the scale lock disengages. Panel settings stay.
    pub fn reset_session_state(&mut self) {
        self.pads.reset();
        self.set_scale_lock(false);
        log::info!("session state reset");
    }

    /// Offline-render a single note: hold for `hold_secs`, then release
    /// and render the release tail. Used for previews and WASM callers.
    pub fn render_note(&mut self, note: Note, hold_secs: f64) -> Vec<f64> {
        let sr = self.ctx.sample_rate();
        let hold = (hold_secs.max(0.0) * sr) as usize;
        let tail = (self.config.envelope.release.max(0.0) * sr) as usize + 1;

        let mut samples = vec![0.0; hold + tail];
        self.key_down(note);
        self.render(&mut samples[..hold]);
        self.key_up(note);
        self.render(&mut samples[hold..]);
        samples
    }

    /// Load a decoded sample into a pad, logging failures.
    pub fn load_pad_sample(&mut self, index: usize, buffer: SampleBuffer, name: String) {
        if let Err(e) = self.pads.load_pad(index, buffer, name, None) {
            log::warn!("pad load failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Register;

    fn note(class: PitchClass) -> Note {
        Note::new(class, Register::Middle).unwrap()
    }

    #[test]
    fn renders_silence_when_idle() {
        let mut synth = Synth::new(44100.0);
        let mut out = vec![1.0; 512];
        synth.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn key_down_produces_audio() {
        let mut synth = Synth::new(44100.0);
        synth.key_down(note(PitchClass::La));

        let mut out = vec![0.0; 4410];
        synth.render(&mut out);
        let peak = out.iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
        assert!(peak > 0.1, "a held key should be audible, got {peak}");
    }

    #[test]
    fn output_is_always_within_unit_range() {
        let mut synth = Synth::new(44100.0);
        // Pile on a loud chord through a hot master volume.
        synth.set_master_volume(5.0);
        for class in [PitchClass::Do, PitchClass::Mi, PitchClass::So, PitchClass::La] {
            synth.key_down(note(class));
        }
        let mut out = vec![0.0; 8820];
        synth.render(&mut out);
        assert!(out.iter().all(|&s| s.abs() <= 1.0), "master stage must clip softly");
    }

    #[test]
    fn bad_effect_config_never_interrupts_other_voices() {
        let mut synth = Synth::new(44100.0);
        synth.key_down(note(PitchClass::Do));

        let mut config = synth.config().clone();
        config.effects.slicer_on = true;
        config.effects.slicer.rate_note = "broken".to_string();
        synth.set_config(config);

        // This key is dropped with a warning; the first keeps sounding.
        synth.key_down(note(PitchClass::Mi));
        assert_eq!(synth.active_voices(), 1);

        let mut out = vec![0.0; 441];
        synth.render(&mut out);
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn voice_is_dropped_after_release_tail_and_nothing_leaks() {
        let mut synth = Synth::new(44100.0);
        let mut config = synth.config().clone();
        config.envelope.release = 0.05;
        config.effects.flanger_on = true;
        config.effects.unyounyo_on = true;
        synth.set_config(config);

        synth.key_down(note(PitchClass::Re));
        assert_eq!(synth.context().running_mod_sources(), 2);

        let mut out = vec![0.0; 2205];
        synth.render(&mut out);
        synth.key_up(note(PitchClass::Re));
        assert_eq!(synth.context().running_mod_sources(), 0);

        // Render past the release window; the voice disappears.
        let mut out = vec![0.0; 4410];
        synth.render(&mut out);
        assert_eq!(synth.active_voices(), 0);
    }

    #[test]
    fn render_note_covers_hold_plus_tail() {
        let mut synth = Synth::new(44100.0);
        let samples = synth.render_note(note(PitchClass::La), 0.1);
        let expected = (0.1 * 44100.0) as usize + (0.3 * 44100.0) as usize + 1;
        assert_eq!(samples.len(), expected);

        let hold_peak = samples[..4410].iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
        assert!(hold_peak > 0.1);
        let end_peak = samples[samples.len() - 441..]
            .iter()
            .fold(0.0_f64, |m, &s| m.max(s.abs()));
        assert!(end_peak < 0.05, "tail should have decayed, got {end_peak}");
    }

    #[test]
    fn session_reset_clears_pads_and_scale_lock() {
        let mut synth = Synth::new(44100.0);
        synth.set_scale_lock(true);
        synth.load_pad_sample(3, SampleBuffer::new(vec![0.5; 100], 44100), "snare".into());
        synth.pad_down(3);
        assert_eq!(synth.pads().playing_instances(), 1);

        synth.reset_session_state();
        assert_eq!(synth.pads().playing_instances(), 0);
        assert!(!synth.config().scale_lock);
        // Settings other than the scale lock survive.
        assert_eq!(synth.config().bpm, 120.0);
    }

    #[test]
    fn scale_lock_follows_config() {
        let mut synth = Synth::new(44100.0);
        let mut config = synth.config().clone();
        config.scale_lock = true;
        config.scale_root = PitchClass::Do;
        synth.set_config(config);

        synth.key_down(note(PitchClass::Fa)); // not in ド pentatonic
        assert_eq!(synth.active_voices(), 0);
        synth.key_down(note(PitchClass::So));
        assert_eq!(synth.active_voices(), 1);
    }
}
