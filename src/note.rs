//! Note table and scale filtering.
//!
//! The keyboard spans 29 equal-tempered notes over three registers: a
//! full low and middle octave plus the first five notes of the high
//! octave (ド through ミ). Note names follow the Japanese solfège labels
//! the UI displays ("低いド", "ド", "高いミ", ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the 12 chromatic pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    Do,
    DoSharp,
    Re,
    ReSharp,
    Mi,
    Fa,
    FaSharp,
    So,
    SoSharp,
    La,
    LaSharp,
    Si,
}

/// All 12 pitch classes in chromatic order.
pub const CHROMATIC_SCALE: [PitchClass; 12] = [
    PitchClass::Do,
    PitchClass::DoSharp,
    PitchClass::Re,
    PitchClass::ReSharp,
    PitchClass::Mi,
    PitchClass::Fa,
    PitchClass::FaSharp,
    PitchClass::So,
    PitchClass::SoSharp,
    PitchClass::La,
    PitchClass::LaSharp,
    PitchClass::Si,
];

const PITCH_CLASS_NAMES: [&str; 12] = [
    "ド", "ド#", "レ", "レ#", "ミ", "ファ", "ファ#", "ソ", "ソ#", "ラ", "ラ#", "シ",
];

impl PitchClass {
    /// Chromatic index, 0 = ド.
    pub fn index(self) -> usize {
        CHROMATIC_SCALE.iter().position(|&c| c == self).unwrap_or(0)
    }

    /// Pitch class at a chromatic index (mod 12).
    pub fn from_index(index: usize) -> Self {
        CHROMATIC_SCALE[index % 12]
    }

    /// The solfège label shown in the UI.
    pub fn name(self) -> &'static str {
        PITCH_CLASS_NAMES[self.index()]
    }

    /// Parse a bare pitch-class label ("ド", "ファ#", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        PITCH_CLASS_NAMES
            .iter()
            .position(|&n| n == name)
            .map(PitchClass::from_index)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyboard register. The high register only reaches ミ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Low,
    Middle,
    High,
}

// Frequencies in Hz, chromatic order from ド, A = 440 tuning.
const LOW_FREQS: [f64; 12] = [
    130.81, 138.59, 146.83, 155.56, 164.81, 174.61, 185.00, 196.00, 207.65, 220.00, 233.08, 246.94,
];
const MIDDLE_FREQS: [f64; 12] = [
    261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.00, 415.30, 440.00, 466.16, 493.88,
];
const HIGH_FREQS: [f64; 5] = [523.25, 554.37, 587.33, 622.25, 659.26];

/// One playable key: a pitch class in a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub class: PitchClass,
    pub register: Register,
}

impl Note {
    /// Create a note, rejecting high-register notes beyond ミ.
    pub fn new(class: PitchClass, register: Register) -> Option<Self> {
        if register == Register::High && class.index() >= HIGH_FREQS.len() {
            return None;
        }
        Some(Note { class, register })
    }

    /// Frequency in Hz from the fixed tuning table.
    pub fn frequency(self) -> f64 {
        let i = self.class.index();
        match self.register {
            Register::Low => LOW_FREQS[i],
            Register::Middle => MIDDLE_FREQS[i],
            Register::High => HIGH_FREQS[i],
        }
    }

    /// Full display name ("低いド", "ラ", "高いミ", ...).
    pub fn name(self) -> String {
        match self.register {
            Register::Low => format!("低い{}", self.class.name()),
            Register::Middle => self.class.name().to_string(),
            Register::High => format!("高い{}", self.class.name()),
        }
    }

    /// Parse a full note name, register prefix included.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(rest) = name.strip_prefix("低い") {
            return Note::new(PitchClass::from_name(rest)?, Register::Low);
        }
        if let Some(rest) = name.strip_prefix("高い") {
            return Note::new(PitchClass::from_name(rest)?, Register::High);
        }
        Note::new(PitchClass::from_name(name)?, Register::Middle)
    }

    /// All 29 playable notes, low to high.
    pub fn all() -> Vec<Note> {
        let mut notes = Vec::with_capacity(29);
        for &class in &CHROMATIC_SCALE {
            notes.push(Note { class, register: Register::Low });
        }
        for &class in &CHROMATIC_SCALE {
            notes.push(Note { class, register: Register::Middle });
        }
        for &class in &CHROMATIC_SCALE[..HIGH_FREQS.len()] {
            notes.push(Note { class, register: Register::High });
        }
        notes
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Major-pentatonic intervals from the root.
const PENTATONIC_INTERVALS: [usize; 5] = [0, 2, 4, 7, 9];

/// Restricts playable pitches to a 5-note pentatonic subset of the
/// chromatic scale. Inactive by default; the derived subset is recomputed
/// whenever the root changes, so toggling and re-keying stay in sync.
#[derive(Debug, Clone)]
pub struct ScaleFilter {
    active: bool,
    root: PitchClass,
    scale: [PitchClass; 5],
}

impl ScaleFilter {
    pub fn new() -> Self {
        let mut f = ScaleFilter {
            active: false,
            root: PitchClass::Do,
            scale: [PitchClass::Do; 5],
        };
        f.recompute();
        f
    }

    fn recompute(&mut self) {
        let root = self.root.index();
        for (slot, interval) in self.scale.iter_mut().zip(PENTATONIC_INTERVALS) {
            *slot = PitchClass::from_index(root + interval);
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if active {
            self.recompute();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_root(&mut self, root: PitchClass) {
        self.root = root;
        self.recompute();
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    /// The derived 5-pitch-class subset.
    pub fn scale(&self) -> &[PitchClass; 5] {
        &self.scale
    }

    /// A note is playable iff the filter is off or its pitch class
    /// (register ignored) is in the pentatonic subset.
    pub fn allows(&self, note: Note) -> bool {
        !self.active || self.scale.contains(&note.class)
    }
}

impl Default for ScaleFilter {
    fn default() -> Self {
        ScaleFilter::new()
    }
}
