//! DSP building blocks: shared context, voice primitives, and the
//! per-note effect chain.

pub mod context;
pub mod delay_line;
pub mod dynamics;
pub mod effects;
pub mod envelope;
pub mod filter;
pub mod lfo;
pub mod mixer;
pub mod oscillator;
