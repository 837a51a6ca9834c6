/// Circular delay line.
///
/// Capacity is fixed at construction or by [`DelayLine::resize`], both of
/// which allocate and belong off the audio thread.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn with_capacity(samples: usize) -> Self {
        Self {
            buffer: vec![0.0; samples.max(2)],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Reallocate and clear.
    pub fn resize(&mut self, samples: usize) {
        self.buffer = vec![0.0; samples.max(2)];
        self.write_pos = 0;
    }

    /// Sample written `delay` pushes ago, clamped to the capacity.
    /// A delay of 0 reads the most recent write.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.min(len - 1);
        self.buffer[(self.write_pos + len - 1 - delay) % len]
    }

    /// Linear interpolation between the two nearest taps.
    #[inline]
    pub fn read_interpolated(&self, delay: f32) -> f32 {
        let delay = delay.clamp(0.0, (self.buffer.len() - 2) as f32);
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let a = self.read(whole);
        let b = self.read(whole + 1);
        a + (b - a) * frac
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
