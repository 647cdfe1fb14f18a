//! Separable radix-2 inverse FFT with ping-pong buffers.
//!
//! Each 1D transform is a Stockham autosort pass: every butterfly stage reads
//! one buffer and writes the other, so no stage overwrites data it still
//! needs and no bit-reversal permutation is required.

use std::f32::consts::PI;

use rayon::prelude::*;
use rustfft::num_complex::Complex32;

use super::{transpose, validate_resolution, FftBackend};
use crate::error::ConfigError;

/// 2D inverse FFT of fixed size `n x n`
pub struct SeparableFft {
    n: usize,
    stages: u32,
    /// `e^{+2πi j / n}` for `j < n / 2`; stage `s` uses every `2^s`-th entry
    twiddles: Vec<Complex32>,
    /// Ping-pong partner of the field being transformed
    scratch: Vec<Complex32>,
}

impl SeparableFft {
    /// Build the twiddle table. `n` must be a power of two.
    pub fn new(n: usize) -> Result<Self, ConfigError> {
        validate_resolution(n)?;
        let twiddles = (0..n / 2)
            .map(|j| Complex32::from_polar(1.0, 2.0 * PI * j as f32 / n as f32))
            .collect();

        Ok(Self {
            n,
            stages: n.trailing_zeros(),
            twiddles,
            scratch: vec![Complex32::new(0.0, 0.0); n * n],
        })
    }

    /// Butterfly stages per 1D pass (`log2 n`)
    pub fn stages(&self) -> u32 {
        self.stages
    }

    /// Twiddle factor for butterfly `p` of `stage`
    pub fn twiddle(&self, stage: u32, p: usize) -> Complex32 {
        self.twiddles[p << stage]
    }

    /// Transform every row of `data`, using `temp` as the ping-pong partner
    fn row_pass(twiddles: &[Complex32], n: usize, data: &mut [Complex32], temp: &mut [Complex32]) {
        data.par_chunks_mut(n)
            .zip(temp.par_chunks_mut(n))
            .for_each(|(row, partner)| {
                if !stockham_inverse(twiddles, row, partner) {
                    row.copy_from_slice(partner);
                }
            });
    }
}

/// One inverse 1D transform. Returns `true` when the result ended up in `src`.
fn stockham_inverse<'a>(
    twiddles: &[Complex32],
    src: &'a mut [Complex32],
    dst: &'a mut [Complex32],
) -> bool {
    let n = src.len();
    let (mut x, mut y) = (src, dst);
    let mut span = n;
    let mut stride = 1;
    let mut in_src = true;

    while span > 1 {
        let half = span / 2;
        for p in 0..half {
            let w = twiddles[p * stride];
            for q in 0..stride {
                let a = x[q + stride * p];
                let b = x[q + stride * (p + half)];
                y[q + stride * 2 * p] = a + b;
                y[q + stride * (2 * p + 1)] = (a - b) * w;
            }
        }
        std::mem::swap(&mut x, &mut y);
        in_src = !in_src;
        span = half;
        stride *= 2;
    }

    in_src
}

impl FftBackend for SeparableFft {
    fn resolution(&self) -> usize {
        self.n
    }

    fn inverse_2d(&mut self, field: &mut [Complex32]) {
        let n = self.n;
        assert_eq!(field.len(), n * n, "field size does not match FFT size");

        // Rows, then columns as rows of the transpose
        Self::row_pass(&self.twiddles, n, field, &mut self.scratch);
        transpose(field, &mut self.scratch, n);
        Self::row_pass(&self.twiddles, n, &mut self.scratch, field);
        transpose(&self.scratch, field, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_two_butterfly() {
        let twiddles = vec![Complex32::new(1.0, 0.0)];
        let mut src = [Complex32::new(1.0, 0.0), Complex32::new(2.0, 0.0)];
        let mut dst = [Complex32::new(0.0, 0.0); 2];
        let in_src = stockham_inverse(&twiddles, &mut src, &mut dst);
        assert!(!in_src);
        assert_eq!(dst[0], Complex32::new(3.0, 0.0));
        assert_eq!(dst[1], Complex32::new(-1.0, 0.0));
    }

    #[test]
    fn test_1d_matches_direct_sum() {
        let n = 8;
        let fft = SeparableFft::new(n).unwrap();
        let input: Vec<Complex32> = (0..n)
            .map(|i| Complex32::new(i as f32 * 0.5 - 1.0, (i * i) as f32 * 0.1))
            .collect();

        let mut src = input.clone();
        let mut dst = vec![Complex32::new(0.0, 0.0); n];
        let in_src = stockham_inverse(&fft.twiddles, &mut src, &mut dst);
        let result = if in_src { src } else { dst };

        for (x, value) in result.iter().enumerate() {
            let expected: Complex32 = input
                .iter()
                .enumerate()
                .map(|(k, c)| c * Complex32::from_polar(1.0, 2.0 * PI * (k * x) as f32 / n as f32))
                .sum();
            assert!((value - expected).norm() < 1e-4, "x={} {} vs {}", x, value, expected);
        }
    }

    #[test]
    fn test_twiddle_table_indexed_by_stage() {
        let fft = SeparableFft::new(16).unwrap();
        assert_eq!(fft.stages(), 4);
        // Stage 3 has span 2: its only twiddle is 1
        assert!((fft.twiddle(3, 0) - Complex32::new(1.0, 0.0)).norm() < 1e-7);
        // Stage 2 has span 4: second twiddle is e^{iπ/2}
        assert!((fft.twiddle(2, 1) - Complex32::new(0.0, 1.0)).norm() < 1e-6);
    }
}
