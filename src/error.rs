use thiserror::Error;

use crate::dsp::effects::EffectId;

/// Errors surfaced by the engine.
///
/// Per-trigger failures (a chain that cannot be built, an unplayable pad)
/// are fatal only to the voice or sample instance that requested them;
/// callers at the control-event boundary log and drop them so other
/// sounding voices are never interrupted.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An effect module rejected its configuration while a chain was
    /// being built. The chain is abandoned and the note never sounds.
    #[error("{effect} effect rejected its configuration: {reason}")]
    InvalidEffectConfig { effect: EffectId, reason: String },

    /// The pad has no sample loaded.
    #[error("pad {0} is empty")]
    PadEmpty(usize),

    /// The pad's sample failed to decode; it is excluded from playback
    /// until it is re-populated.
    #[error("pad {0} failed to load and cannot be triggered")]
    PadUnplayable(usize),

    /// A pad index outside 0..9.
    #[error("pad index {0} out of range")]
    PadIndexOutOfRange(usize),

    /// A sample buffer could not be produced from its source.
    #[error("sample decode failed: {0}")]
    Decode(String),

    /// The preset store rejected an operation.
    #[error("preset store error: {0}")]
    Store(String),
}
