pub mod config;
pub mod dsp;
pub mod error;
pub mod note;
pub mod pads;
pub mod preset;
pub mod synth;
pub mod timing;
pub mod voice;
pub mod voice_manager;

use wasm_bindgen::prelude::*;

use crate::config::SynthConfig;
use crate::note::Note;
use crate::synth::Synth;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the padtone-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: render one note to mono f32 samples: held for
/// `hold_secs`, then released through its tail. `config` is a
/// [`SynthConfig`] as a JS object; pass `null` for the defaults.
#[wasm_bindgen]
pub fn render_note_samples(
    note_name: &str,
    hold_secs: f64,
    sample_rate: u32,
    config: JsValue,
) -> Result<Vec<f32>, JsValue> {
    let note = Note::from_name(note_name)
        .ok_or_else(|| JsValue::from_str(&format!("unknown note name: {note_name}")))?;
    let config: SynthConfig = if config.is_null() || config.is_undefined() {
        SynthConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("{e}")))?
    };

    let mut synth = Synth::new(sample_rate as f64);
    synth.set_config(config);
    let samples = synth.render_note(note, hold_secs);
    Ok(samples.iter().map(|&s| s as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_names_resolve_for_rendering() {
        assert!(Note::from_name("ラ").is_some());
        assert!(Note::from_name("高いミ").is_some());
        assert!(Note::from_name("高いシ").is_none());
        assert!(Note::from_name("bogus").is_none());
    }
}
