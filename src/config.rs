//! Global synth configuration.
//!
//! These fields mirror the control panel. Voices and effect chains never
//! read them live: the relevant values are snapshotted at voice-creation
//! or chain-build time, so moving a slider mid-note affects only future
//! notes (the chains already built keep the settings they were born with).

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::note::PitchClass;

/// Parse a BPM field, falling back to 120 on junk or non-positive input.
pub fn parse_bpm(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 120.0,
    }
}

/// Parse a numeric control field, treating junk (and NaN) as 0 so bad
/// input never propagates into scheduled automation.
pub fn parse_control(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Amplitude envelope times and sustain level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Linear attack time in seconds.
    pub attack: f64,
    /// Decay time constant in seconds (exponential approach to sustain).
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds; the voice is removed after this elapses.
    pub release: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig { attack: 0.01, decay: 0.1, sustain: 0.7, release: 0.3 }
    }
}

/// The shared per-voice LFO: one rate fanned out through three depths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LfoConfig {
    /// LFO rate in Hz.
    pub rate: f64,
    /// Pitch modulation depth in Hz.
    pub pitch_depth: f64,
    /// Filter-cutoff modulation depth in Hz.
    pub filter_depth: f64,
    /// Amplitude modulation depth (added to envelope gain).
    pub amp_depth: f64,
}

impl Default for LfoConfig {
    fn default() -> Self {
        LfoConfig { rate: 5.0, pitch_depth: 0.0, filter_depth: 0.0, amp_depth: 0.0 }
    }
}

// ── Per-effect parameters ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionParams {
    /// Pre-gain into the saturation curve.
    pub gain: f64,
    /// High-shelf gain in dB at 3.5 kHz.
    pub treble_db: f64,
    /// Center of the mid notch/boost in Hz.
    pub mid_freq: f64,
    /// Mid peaking gain in dB (negative scoops).
    pub mid_cut_db: f64,
}

impl Default for DistortionParams {
    fn default() -> Self {
        DistortionParams { gain: 5.0, treble_db: 0.0, mid_freq: 800.0, mid_cut_db: -6.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BitcrusherParams {
    /// Bit depth; 24 or more bypasses quantization entirely.
    pub depth: u32,
    /// Hold each quantized sample for this many input samples.
    pub rate_divide: u32,
}

impl Default for BitcrusherParams {
    fn default() -> Self {
        BitcrusherParams { depth: 8, rate_divide: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LofiParams {
    /// Cutoff of the two cascaded muffle filters, in Hz.
    pub muffle_hz: f64,
    /// Tape-hiss level; 0 disables the noise source.
    pub hiss: f64,
}

impl Default for LofiParams {
    fn default() -> Self {
        LofiParams { muffle_hz: 1200.0, hiss: 0.1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Lowpass cutoff in Hz.
    pub cutoff: f64,
    /// Resonance (filter Q).
    pub resonance: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        FilterParams { cutoff: 1200.0, resonance: 5.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerParams {
    /// Gate interval as a note token; the gate toggles every half cycle.
    pub rate_note: String,
    /// Dry/wet mix [0, 1].
    pub mix: f64,
}

impl Default for SlicerParams {
    fn default() -> Self {
        SlicerParams { rate_note: "8".to_string(), mix: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnyounyoParams {
    /// Wobble amount; LFO rate is `|pitch - 1| * 10` Hz.
    pub pitch: f64,
    /// Dry/wet mix [0, 1].
    pub mix: f64,
}

impl Default for UnyounyoParams {
    fn default() -> Self {
        UnyounyoParams { pitch: 0.5, mix: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlangerParams {
    /// Sweep rate as a note token (converted to Hz from the tempo).
    pub rate_note: String,
    /// Delay-time modulation depth in seconds.
    pub depth: f64,
    /// Dry/wet mix [0, 1].
    pub mix: f64,
}

impl Default for FlangerParams {
    fn default() -> Self {
        FlangerParams { rate_note: "1".to_string(), depth: 0.002, mix: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayParams {
    /// Delay time as a note token.
    pub time_note: String,
    /// Feedback amount [0, 1).
    pub feedback: f64,
    /// Dry/wet mix [0, 1].
    pub mix: f64,
}

impl Default for DelayParams {
    fn default() -> Self {
        DelayParams { time_note: "8".to_string(), feedback: 0.4, mix: 0.35 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    /// Dry/wet mix [0, 1].
    pub mix: f64,
    /// Feedback gain inside the tank [0, 1).
    pub decay: f64,
    /// Tap-length scale in seconds.
    pub time: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        ReverbParams { mix: 0.4, decay: 0.6, time: 1.0 }
    }
}

/// The nine effect toggles plus their parameters: the full snapshot an
/// effect chain is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub distortion_on: bool,
    pub bitcrusher_on: bool,
    pub lofi_on: bool,
    pub filter_on: bool,
    pub slicer_on: bool,
    pub unyounyo_on: bool,
    pub flanger_on: bool,
    pub delay_on: bool,
    pub reverb_on: bool,

    pub distortion: DistortionParams,
    pub bitcrusher: BitcrusherParams,
    pub lofi: LofiParams,
    pub filter: FilterParams,
    pub slicer: SlicerParams,
    pub unyounyo: UnyounyoParams,
    pub flanger: FlangerParams,
    pub delay: DelayParams,
    pub reverb: ReverbParams,
}

impl EffectSettings {
    /// Number of enabled effects (drives the makeup-gain stage).
    pub fn enabled_count(&self) -> usize {
        [
            self.distortion_on,
            self.bitcrusher_on,
            self.lofi_on,
            self.filter_on,
            self.slicer_on,
            self.unyounyo_on,
            self.flanger_on,
            self.delay_on,
            self.reverb_on,
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }
}

/// Everything the control panel exposes, read by the engine at
/// voice-creation / chain-build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub bpm: f64,
    /// Master output gain (linear), applied live at the mix stage.
    pub master_volume: f64,
    pub waveform: Waveform,
    /// Pulse-width-modulation depth; only square waves with a nonzero
    /// depth get the PWM sub-oscillator.
    pub pwm_depth: f64,
    pub envelope: EnvelopeConfig,
    pub lfo: LfoConfig,
    pub effects: EffectSettings,
    /// Sample-pad gain slider; the engine scales it by 10.
    pub pad_volume: f64,
    /// Overlapping retriggers per pad when true; exclusive when false.
    pub pad_polyphony: bool,
    /// Global sample pitch-shift in semitones.
    pub pitch_shift: i32,
    /// Pentatonic scale lock.
    pub scale_lock: bool,
    pub scale_root: PitchClass,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            bpm: 120.0,
            master_volume: 1.0,
            waveform: Waveform::Square,
            pwm_depth: 0.0,
            envelope: EnvelopeConfig::default(),
            lfo: LfoConfig::default(),
            effects: EffectSettings::default(),
            pad_volume: 1.0,
            pad_polyphony: true,
            pitch_shift: 0,
            scale_lock: false,
            scale_root: PitchClass::Do,
        }
    }
}
