//! The 3x3 sample-pad engine.
//!
//! Each pad slot holds a decoded sample buffer (or a record that decoding
//! failed, which keeps the pad visible but unplayable). Triggering spawns
//! a playback instance with its own effect chain; in exclusive mode the
//! pad's previous instances are cut first, in polyphonic mode they
//! overlap. However an instance ends (natural completion, an exclusive
//! retrigger, or a reset), its chain teardowns run exactly once.

use std::rc::Rc;

use crate::config::SynthConfig;
use crate::dsp::context::EngineContext;
use crate::dsp::effects::EffectChain;
use crate::error::EngineError;

pub const PAD_COUNT: usize = 9;

/// A decoded mono sample.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    /// Mono f64 samples.
    pub data: Vec<f64>,
    /// Native sample rate of the audio.
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(data: Vec<f64>, sample_rate: u32) -> Self {
        SampleBuffer { data, sample_rate }
    }

    /// Create from 16-bit signed PCM data.
    pub fn from_i16(pcm: &[i16], sample_rate: u32) -> Self {
        let data: Vec<f64> = pcm.iter().map(|&s| s as f64 / 32768.0).collect();
        SampleBuffer { data, sample_rate }
    }

    /// Create from f32 samples.
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Self {
        let data: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        SampleBuffer { data, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read a sample with linear interpolation at a fractional position.
    pub fn read_interpolated(&self, position: f64) -> f64 {
        if self.data.is_empty() || position < 0.0 {
            return 0.0;
        }

        let idx = position as usize;
        if idx >= self.data.len() - 1 {
            return if idx < self.data.len() {
                self.data[idx]
            } else {
                0.0
            };
        }

        let frac = position - idx as f64;
        self.data[idx] * (1.0 - frac) + self.data[idx + 1] * frac
    }
}

/// A loaded pad: its sample plus display metadata.
#[derive(Debug, Clone)]
pub struct PadState {
    pub buffer: Rc<SampleBuffer>,
    pub name: String,
    pub url: Option<String>,
    /// Flip the waveform's polarity on playback.
    pub inverted: bool,
}

/// What a pad slot currently holds.
#[derive(Debug, Clone, Default)]
pub enum PadSlot {
    #[default]
    Empty,
    /// The source could not be decoded; the pad is excluded from playback
    /// until re-populated.
    Failed,
    Loaded(PadState),
}

/// A playing sample instance.
struct SampleInstance {
    pad: usize,
    buffer: Rc<SampleBuffer>,
    position: f64,
    /// Playback step per output sample, sample-rate ratio included.
    step: f64,
    gain: f64,
    chain: EffectChain,
}

impl SampleInstance {
    fn next_sample(&mut self) -> f64 {
        let s = self.buffer.read_interpolated(self.position) * self.gain;
        self.position += self.step;
        self.chain.process(s, 0.0)
    }

    fn is_finished(&self) -> bool {
        self.position >= self.buffer.len() as f64
    }
}

pub struct SamplePadEngine {
    ctx: EngineContext,
    slots: [PadSlot; PAD_COUNT],
    instances: Vec<SampleInstance>,
    /// Global pitch shift in semitones, applied to running instances too.
    pitch_shift: i32,
}

impl SamplePadEngine {
    pub fn new(ctx: &EngineContext) -> Self {
        SamplePadEngine {
            ctx: ctx.clone(),
            slots: Default::default(),
            instances: Vec::new(),
            pitch_shift: 0,
        }
    }

    fn check_index(index: usize) -> Result<(), EngineError> {
        if index >= PAD_COUNT {
            return Err(EngineError::PadIndexOutOfRange(index));
        }
        Ok(())
    }

    /// Populate a pad.
    pub fn load_pad(
        &mut self,
        index: usize,
        buffer: SampleBuffer,
        name: String,
        url: Option<String>,
    ) -> Result<(), EngineError> {
        Self::check_index(index)?;
        log::info!("pad {index} loaded: {name} ({} samples)", buffer.len());
        self.slots[index] = PadSlot::Loaded(PadState {
            buffer: Rc::new(buffer),
            name,
            url,
            inverted: false,
        });
        Ok(())
    }

    /// Record that a pad's source failed to decode. The pad stays visible
    /// but cannot be triggered.
    pub fn mark_pad_failed(&mut self, index: usize) -> Result<(), EngineError> {
        Self::check_index(index)?;
        log::warn!("pad {index} marked unplayable after decode failure");
        self.stop_pad(index);
        self.slots[index] = PadSlot::Failed;
        Ok(())
    }

    pub fn clear_pad(&mut self, index: usize) -> Result<(), EngineError> {
        Self::check_index(index)?;
        self.stop_pad(index);
        self.slots[index] = PadSlot::Empty;
        Ok(())
    }

    pub fn set_inverted(&mut self, index: usize, inverted: bool) -> Result<(), EngineError> {
        Self::check_index(index)?;
        if let PadSlot::Loaded(state) = &mut self.slots[index] {
            state.inverted = inverted;
        }
        Ok(())
    }

    pub fn slot(&self, index: usize) -> Option<&PadSlot> {
        self.slots.get(index)
    }

    /// Trigger a pad with a snapshot of the current config. Empty pads
    /// are silent no-ops; failed pads error; a rejected effect chain
    /// errors and the pad never sounds.
    pub fn trigger(&mut self, index: usize, config: &SynthConfig) -> Result<(), EngineError> {
        Self::check_index(index)?;
        let state = match &self.slots[index] {
            PadSlot::Empty => return Ok(()),
            PadSlot::Failed => return Err(EngineError::PadUnplayable(index)),
            PadSlot::Loaded(state) => state.clone(),
        };

        let chain = EffectChain::build(&self.ctx, &config.effects, config.bpm)?;

        if !config.pad_polyphony {
            self.stop_pad(index);
        }

        let mut gain = config.pad_volume * 10.0;
        if state.inverted {
            gain = -gain;
        }

        self.instances.push(SampleInstance {
            pad: index,
            step: self.playback_step(&state.buffer),
            buffer: state.buffer,
            position: 0.0,
            gain,
            chain,
        });
        Ok(())
    }

    /// Cut every instance of a pad, releasing each chain's modulation
    /// sources. Tolerant of pads with nothing playing.
    pub fn stop_pad(&mut self, index: usize) {
        for inst in self.instances.iter_mut().filter(|i| i.pad == index) {
            inst.chain.release_teardowns();
        }
        self.instances.retain(|inst| inst.pad != index);
    }

    /// Retune: future triggers and already-running instances both pick up
    /// the new shift.
    pub fn set_pitch_shift(&mut self, semitones: i32) {
        self.pitch_shift = semitones;
        let sr = self.ctx.sample_rate();
        for inst in &mut self.instances {
            let ratio = inst.buffer.sample_rate as f64 / sr;
            inst.step = 2.0_f64.powf(semitones as f64 / 12.0) * ratio;
        }
    }

    pub fn pitch_shift(&self) -> i32 {
        self.pitch_shift
    }

    fn playback_step(&self, buffer: &SampleBuffer) -> f64 {
        let ratio = buffer.sample_rate as f64 / self.ctx.sample_rate();
        2.0_f64.powf(self.pitch_shift as f64 / 12.0) * ratio
    }

    /// Sum one sample from every running instance, dropping the finished.
    pub fn next_sample(&mut self) -> f64 {
        let mut sum = 0.0;
        for inst in &mut self.instances {
            sum += inst.next_sample();
            if inst.is_finished() {
                inst.chain.release_teardowns();
            }
        }
        self.instances.retain(|inst| !inst.is_finished());
        sum
    }

    pub fn playing_instances(&self) -> usize {
        self.instances.len()
    }

    /// Drop all pads and instances (new-session reset).
    pub fn reset(&mut self) {
        for inst in &mut self.instances {
            inst.chain.release_teardowns();
        }
        self.instances.clear();
        self.slots = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EngineContext {
        EngineContext::new(44100.0)
    }

    fn config(polyphonic: bool, volume: f64) -> SynthConfig {
        let mut c = SynthConfig::default();
        c.pad_polyphony = polyphonic;
        c.pad_volume = volume;
        c
    }

    fn engine_with_pad(ctx: &EngineContext, index: usize, len: usize) -> SamplePadEngine {
        let mut engine = SamplePadEngine::new(ctx);
        let buffer = SampleBuffer::new(vec![0.5; len], 44100);
        engine.load_pad(index, buffer, "kick".to_string(), None).unwrap();
        engine
    }

    #[test]
    fn empty_pad_trigger_is_silent_noop() {
        let mut engine = SamplePadEngine::new(&ctx());
        engine.trigger(0, &config(true, 1.0)).unwrap();
        assert_eq!(engine.playing_instances(), 0);
        assert_eq!(engine.next_sample(), 0.0);
    }

    #[test]
    fn failed_pad_cannot_be_triggered() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 2, 100);
        engine.mark_pad_failed(2).unwrap();
        let err = engine.trigger(2, &config(true, 1.0)).unwrap_err();
        assert!(matches!(err, EngineError::PadUnplayable(2)));
    }

    #[test]
    fn out_of_range_index_errors() {
        let mut engine = SamplePadEngine::new(&ctx());
        assert!(matches!(
            engine.trigger(9, &config(true, 1.0)),
            Err(EngineError::PadIndexOutOfRange(9))
        ));
    }

    #[test]
    fn volume_slider_is_scaled_by_ten() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 100);
        engine.trigger(0, &config(true, 0.1)).unwrap();
        // 0.5 sample value * 0.1 * 10 = 0.5
        assert!((engine.next_sample() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn inverted_pad_flips_polarity() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 100);
        engine.set_inverted(0, true).unwrap();
        engine.trigger(0, &config(true, 0.1)).unwrap();
        assert!((engine.next_sample() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn exclusive_mode_cuts_previous_instance() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 10000);
        let cfg = config(false, 1.0);
        engine.trigger(0, &cfg).unwrap();
        for _ in 0..100 {
            engine.next_sample();
        }
        engine.trigger(0, &cfg).unwrap();
        assert_eq!(engine.playing_instances(), 1);
    }

    #[test]
    fn polyphonic_mode_overlaps_instances() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 10000);
        let cfg = config(true, 1.0);
        engine.trigger(0, &cfg).unwrap();
        engine.trigger(0, &cfg).unwrap();
        engine.trigger(0, &cfg).unwrap();
        assert_eq!(engine.playing_instances(), 3);
    }

    #[test]
    fn pitch_shift_changes_playback_rate() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 10000);
        engine.set_pitch_shift(12); // one octave up = double speed
        engine.trigger(0, &config(true, 1.0)).unwrap();

        for _ in 0..100 {
            engine.next_sample();
        }
        let pos = engine.instances[0].position;
        assert!((pos - 200.0).abs() < 1.0, "octave up should advance 2x, got {pos}");
    }

    #[test]
    fn pitch_shift_retunes_running_instances() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 100000);
        engine.trigger(0, &config(true, 1.0)).unwrap();
        for _ in 0..100 {
            engine.next_sample();
        }
        engine.set_pitch_shift(-12); // half speed from here on
        let before = engine.instances[0].position;
        for _ in 0..100 {
            engine.next_sample();
        }
        let advanced = engine.instances[0].position - before;
        assert!((advanced - 50.0).abs() < 1.0, "half speed should advance 50, got {advanced}");
    }

    #[test]
    fn finished_instances_are_retired() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 50);
        engine.trigger(0, &config(true, 1.0)).unwrap();
        for _ in 0..60 {
            engine.next_sample();
        }
        assert_eq!(engine.playing_instances(), 0);
    }

    #[test]
    fn instance_chains_release_on_every_exit_path() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 50);
        let mut cfg = config(false, 1.0);
        cfg.effects.flanger_on = true;

        // Natural completion.
        engine.trigger(0, &cfg).unwrap();
        assert_eq!(ctx.running_mod_sources(), 1);
        for _ in 0..60 {
            engine.next_sample();
        }
        assert_eq!(ctx.running_mod_sources(), 0);

        // Exclusive retrigger cuts the old instance's sources.
        engine.trigger(0, &cfg).unwrap();
        engine.trigger(0, &cfg).unwrap();
        assert_eq!(engine.playing_instances(), 1);
        assert_eq!(ctx.running_mod_sources(), 1);

        // Reset.
        engine.reset();
        assert_eq!(ctx.running_mod_sources(), 0);
    }

    #[test]
    fn rejected_chain_means_the_pad_never_sounds() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 0, 100);
        let mut cfg = config(true, 1.0);
        cfg.effects.delay_on = true;
        cfg.effects.delay.time_note = "??".to_string();

        assert!(engine.trigger(0, &cfg).is_err());
        assert_eq!(engine.playing_instances(), 0);
        assert_eq!(ctx.running_mod_sources(), 0);
    }

    #[test]
    fn sample_rate_conversion_respected() {
        let ctx = ctx();
        let mut engine = SamplePadEngine::new(&ctx);
        // 22.05k sample plays at half step through a 44.1k engine.
        let buffer = SampleBuffer::new(vec![0.5; 1000], 22050);
        engine.load_pad(0, buffer, "half".to_string(), None).unwrap();
        engine.trigger(0, &config(true, 1.0)).unwrap();
        for _ in 0..100 {
            engine.next_sample();
        }
        let pos = engine.instances[0].position;
        assert!((pos - 50.0).abs() < 1.0, "expected half-rate advance, got {pos}");
    }

    #[test]
    fn reset_clears_everything() {
        let ctx = ctx();
        let mut engine = engine_with_pad(&ctx, 4, 1000);
        engine.trigger(4, &config(true, 1.0)).unwrap();
        engine.reset();
        assert_eq!(engine.playing_instances(), 0);
        assert!(matches!(engine.slot(4), Some(PadSlot::Empty)));
    }

    #[test]
    fn slot_lookup_rejects_out_of_range_index() {
        let engine = engine_with_pad(&ctx(), 8, 100);
        assert!(matches!(engine.slot(8), Some(PadSlot::Loaded(_))));
        assert!(engine.slot(9).is_none());
        assert!(engine.slot(usize::MAX).is_none());
    }

    #[test]
    fn buffer_interpolation() {
        let buf = SampleBuffer::new(vec![0.0, 1.0, 0.0, -1.0], 44100);
        assert!((buf.read_interpolated(0.0) - 0.0).abs() < 0.001);
        assert!((buf.read_interpolated(0.5) - 0.5).abs() < 0.001);
        assert!((buf.read_interpolated(1.0) - 1.0).abs() < 0.001);
        assert!((buf.read_interpolated(1.5) - 0.5).abs() < 0.001);
    }
}
