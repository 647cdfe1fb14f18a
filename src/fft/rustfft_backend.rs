//! Row/column inverse FFT built on a rustfft plan.

use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use super::{transpose, validate_resolution, FftBackend};
use crate::error::ConfigError;

pub struct RustFftBackend {
    n: usize,
    plan: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex32>,
    transposed: Vec<Complex32>,
}

impl RustFftBackend {
    pub fn new(n: usize) -> Result<Self, ConfigError> {
        validate_resolution(n)?;
        let plan = FftPlanner::new().plan_fft_inverse(n);
        let scratch = vec![Complex32::new(0.0, 0.0); plan.get_inplace_scratch_len()];

        Ok(Self {
            n,
            plan,
            scratch,
            transposed: vec![Complex32::new(0.0, 0.0); n * n],
        })
    }
}

impl FftBackend for RustFftBackend {
    fn resolution(&self) -> usize {
        self.n
    }

    fn inverse_2d(&mut self, field: &mut [Complex32]) {
        let n = self.n;
        assert_eq!(field.len(), n * n, "field size does not match FFT size");

        // A buffer of n*n is processed as n consecutive rows
        self.plan.process_with_scratch(field, &mut self.scratch);
        transpose(field, &mut self.transposed, n);
        self.plan
            .process_with_scratch(&mut self.transposed, &mut self.scratch);
        transpose(&self.transposed, field, n);
    }
}
