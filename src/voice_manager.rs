//! Polyphonic voice tracking, keyed by note.

use std::collections::HashMap;

use crate::config::SynthConfig;
use crate::dsp::context::EngineContext;
use crate::error::EngineError;
use crate::note::{Note, ScaleFilter};
use crate::voice::Voice;

/// Holds every sounding voice, applies the scale filter at note-on, and
/// drops released voices once their release window has elapsed.
pub struct VoiceManager {
    voices: HashMap<Note, Voice>,
    /// (note, deadline in samples) for voices in their release tail.
    removals: Vec<(Note, u64)>,
    pub scale_filter: ScaleFilter,
}

impl VoiceManager {
    pub fn new() -> Self {
        VoiceManager {
            voices: HashMap::new(),
            removals: Vec::new(),
            scale_filter: ScaleFilter::new(),
        }
    }

    /// Start a voice for `note`. Holding a key retriggers nothing: an
    /// already-sounding note is a no-op, as is a note the scale filter
    /// rejects.
    pub fn note_on(
        &mut self,
        ctx: &EngineContext,
        note: Note,
        config: &SynthConfig,
    ) -> Result<(), EngineError> {
        if !self.scale_filter.allows(note) {
            log::debug!("note {note} blocked by scale filter");
            return Ok(());
        }
        if self.voices.contains_key(&note) {
            return Ok(());
        }

        let voice = Voice::new(ctx, note, config)?;
        log::trace!("voice on: {note}");
        self.voices.insert(note, voice);
        Ok(())
    }

    /// Release `note`. Unknown or already-releasing notes are no-ops, so
    /// repeated key-up events never double-release a voice.
    pub fn note_off(&mut self, ctx: &EngineContext, note: Note) {
        let Some(voice) = self.voices.get_mut(&note) else {
            return;
        };
        if voice.is_releasing() {
            return;
        }
        voice.release();
        let deadline = ctx.now_samples() + ctx.seconds_to_samples(voice.release_seconds());
        self.removals.push((note, deadline));
        log::trace!("voice off: {note}");
    }

    /// Drop voices whose release deadline has passed. Called once per
    /// output sample.
    pub fn dispatch_removals(&mut self, ctx: &EngineContext) {
        let now = ctx.now_samples();
        if self.removals.is_empty() {
            return;
        }
        let mut i = 0;
        while i < self.removals.len() {
            if self.removals[i].1 <= now {
                let (note, _) = self.removals.swap_remove(i);
                self.voices.remove(&note);
            } else {
                i += 1;
            }
        }
    }

    /// Sum one sample from every sounding voice.
    pub fn next_sample(&mut self) -> f64 {
        self.voices.values_mut().map(Voice::next_sample).sum()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn is_sounding(&self, note: Note) -> bool {
        self.voices.contains_key(&note)
    }
}

impl Default for VoiceManager {
    fn default() -> Self {
        VoiceManager::new()
    }
}
