//! Pad presets: persisting which sample lives on which pad.
//!
//! A preset records the source URL, display name, and inversion flag per
//! pad, not the decoded audio. Applying a preset re-fetches each source
//! through a caller-supplied loader; a pad whose source no longer decodes
//! is marked failed and the rest keep loading.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::pads::{PadSlot, SampleBuffer, SamplePadEngine, PAD_COUNT};

/// One pad's persisted state. `url: None` means the pad was empty or its
/// sample had no re-fetchable source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PadPreset {
    pub url: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inverted: bool,
}

/// A full pad-bank snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    pub pads: Vec<PadPreset>,
}

impl Preset {
    /// Snapshot the current pad bank.
    pub fn gather(pads: &SamplePadEngine) -> Self {
        let pads = (0..PAD_COUNT)
            .map(|i| match pads.slot(i) {
                Some(PadSlot::Loaded(state)) => PadPreset {
                    url: state.url.clone(),
                    name: state.name.clone(),
                    inverted: state.inverted,
                },
                _ => PadPreset::default(),
            })
            .collect();
        Preset { pads }
    }

    /// Rebuild the pad bank from this preset. `loader` decodes one URL
    /// into a sample buffer; per-pad failures are recorded on the pad and
    /// never abort the rest.
    pub fn apply<F>(&self, pads: &mut SamplePadEngine, mut loader: F)
    where
        F: FnMut(&str) -> Result<SampleBuffer, EngineError>,
    {
        for (i, pad) in self.pads.iter().enumerate().take(PAD_COUNT) {
            let Some(url) = &pad.url else {
                let _ = pads.clear_pad(i);
                continue;
            };
            match loader(url) {
                Ok(buffer) => {
                    let _ = pads.load_pad(i, buffer, pad.name.clone(), Some(url.clone()));
                    let _ = pads.set_inverted(i, pad.inverted);
                }
                Err(e) => {
                    log::warn!("pad {i} source {url:?} failed to load: {e}");
                    let _ = pads.mark_pad_failed(i);
                }
            }
        }
    }
}

/// Who is signed in, if anyone. Presets are only persisted for a session
/// with a user.
pub trait SessionProvider {
    fn current_user_id(&self) -> Option<String>;
}

/// Where presets live. Implementations sit outside the engine (browser
/// storage, a backend); tests use an in-memory map.
pub trait PresetStore {
    fn save(&mut self, user_id: &str, preset: &Preset) -> Result<(), EngineError>;
    fn load(&self, user_id: &str) -> Result<Option<Preset>, EngineError>;
}

/// Persist the current pad bank for the signed-in user. Without a user
/// this is a logged no-op.
pub fn save_for_session(
    session: &dyn SessionProvider,
    store: &mut dyn PresetStore,
    pads: &SamplePadEngine,
) -> Result<bool, EngineError> {
    let Some(user_id) = session.current_user_id() else {
        log::debug!("no signed-in user; preset not saved");
        return Ok(false);
    };
    store.save(&user_id, &Preset::gather(pads))?;
    Ok(true)
}
