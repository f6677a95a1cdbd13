//! Musical timing math: note-value tokens to seconds and Hz.
//!
//! A note token is a fractional note value ("4" = quarter note, "8" =
//! eighth, "16" = sixteenth), optionally suffixed with `d` for dotted
//! ("4d" = dotted quarter). Effect modules use these to derive delay
//! times and modulation rates from the current tempo.

/// Convert a note token and tempo into an absolute duration in seconds.
///
/// `(60 / bpm) * (4 / value)`, times 1.5 for a dotted token. Returns 0.0
/// when the bpm is 0 or the token is not numeric; callers treat a zero
/// duration as "this rate cannot be realized".
pub fn duration_seconds(token: &str, bpm: f64) -> f64 {
    let (body, dotted) = match token.strip_suffix('d') {
        Some(body) => (body, true),
        None => (token, false),
    };
    let value: f64 = match body.trim().parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    if bpm == 0.0 || value == 0.0 || !value.is_finite() {
        return 0.0;
    }
    let mut duration = (60.0 / bpm) * (4.0 / value);
    if dotted {
        duration *= 1.5;
    }
    duration
}

/// Convert a note token and tempo into a modulation frequency in Hz.
///
/// Exact reciprocal of [`duration_seconds`]; 0.0 when the duration is 0.
pub fn frequency_hz(token: &str, bpm: f64) -> f64 {
    let duration = duration_seconds(token, bpm);
    if duration > 0.0 { 1.0 / duration } else { 0.0 }
}
