use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/*
| response  | passes          | rejects      |
| --------- | --------------- | ------------ |
| low-pass  | below cutoff    | above cutoff |
| high-pass | above cutoff    | below cutoff |
| band-pass | around cutoff   | elsewhere    |
| notch     | away from it    | at cutoff    |
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

/// Trapezoidal state-variable filter.
///
/// Coefficients depend only on cutoff, resonance and rate, so they are
/// computed once per block with [`SVFilter::prepare`] and the per-sample
/// [`SVFilter::tick`] is three multiplies and a handful of adds.
#[derive(Debug, Clone)]
pub struct SVFilter {
    ic1eq: f32,
    ic2eq: f32,
    g: f32,
    k: f32,
    h: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 2.0,
            h: 1.0,
            filter_type,
        };
        filter.prepare(1_000.0, 0.0, 48_000.0);
        filter
    }

    pub fn lowpass() -> Self {
        Self::new(FilterType::LowPass)
    }

    /// `resonance` runs from 0 (flat) to just under 1 (self-oscillation).
    pub fn prepare(&mut self, cutoff_hz: f32, resonance: f32, sample_rate: f32) {
        let cutoff = cutoff_hz.clamp(10.0, sample_rate * 0.49);
        self.g = (PI * cutoff / sample_rate).tan();
        self.k = 2.0 - 2.0 * resonance.clamp(0.0, 0.99);
        self.h = 1.0 / (1.0 + self.g * (self.g + self.k));
    }

    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = self.h * (self.ic1eq + self.g * v3);
        let v2 = self.ic2eq + self.g * v1;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        match self.filter_type {
            FilterType::LowPass => v2,
            FilterType::HighPass => input - self.k * v1 - v2,
            FilterType::BandPass => v1,
            FilterType::Notch => input - self.k * v1,
        }
    }

    pub fn set_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
