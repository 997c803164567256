//! Circular convolution in the frequency domain

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Multiplies several equal-length real signals together under circular convolution
///
/// Plans are built once per instance; the scratch buffers are reused between
/// calls, so one convolver serves a whole transform batch.
pub struct CircularConvolver {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    spectrum: Vec<Complex<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl CircularConvolver {
    /// Plan forward and inverse transforms of length `len`
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            len,
            forward,
            inverse,
            spectrum: vec![Complex::new(0.0, 0.0); len],
            buffer: vec![Complex::new(0.0, 0.0); len],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Signal length this convolver was planned for
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the planned length is zero
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Circular convolution of all `signals`, written into `out`
    ///
    /// Every signal and `out` must have the planned length.
    pub fn convolve(&mut self, signals: &[Vec<f64>], out: &mut [f64]) {
        debug_assert!(signals.iter().all(|s| s.len() == self.len));
        debug_assert_eq!(out.len(), self.len);

        self.spectrum.fill(Complex::new(1.0, 0.0));
        for signal in signals {
            for (slot, &value) in self.buffer.iter_mut().zip(signal) {
                *slot = Complex::new(value, 0.0);
            }
            self.forward
                .process_with_scratch(&mut self.buffer, &mut self.scratch);
            for (acc, &bin) in self.spectrum.iter_mut().zip(&self.buffer) {
                *acc *= bin;
            }
        }

        self.inverse
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        // rustfft leaves the inverse unnormalized
        let norm = 1.0 / self.len as f64;
        for (dst, bin) in out.iter_mut().zip(&self.spectrum) {
            *dst = bin.re * norm;
        }
    }
}
