//! Mono delay line with fractional read.

/// A circular delay buffer. Writes advance one sample at a time; reads can
/// land between samples (linear interpolation), which modulated delays
/// need to avoid zipper noise.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    write_pos: usize,
}

impl DelayLine {
    /// Capacity for `max_delay` seconds at `sample_rate`.
    pub fn new(max_delay: f64, sample_rate: f64) -> Self {
        let len = ((max_delay * sample_rate) as usize + 2).max(4);
        DelayLine {
            buffer: vec![0.0; len],
            write_pos: 0,
        }
    }

    pub fn max_delay_samples(&self) -> f64 {
        (self.buffer.len() - 1) as f64
    }

    /// Read `delay_samples` behind the write head with linear interpolation.
    pub fn read(&self, delay_samples: f64) -> f64 {
        let buffer_len = self.buffer.len();
        let delay_samples = delay_samples.clamp(0.0, self.max_delay_samples());
        let delay_int = delay_samples as usize;
        let frac = delay_samples - delay_int as f64;

        let read_pos_0 = if self.write_pos >= delay_int {
            self.write_pos - delay_int
        } else {
            buffer_len - (delay_int - self.write_pos)
        };
        let read_pos_1 = if read_pos_0 == 0 {
            buffer_len - 1
        } else {
            read_pos_0 - 1
        };

        let s0 = self.buffer[read_pos_0];
        let s1 = self.buffer[read_pos_1];
        s0 + frac * (s1 - s0)
    }

    /// Write one sample and advance the head.
    pub fn write(&mut self, sample: f64) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
