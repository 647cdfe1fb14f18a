//! Inverse 2D FFT engines that turn packed spectra into spatial fields.
//!
//! Spectra are stored centred (bin `N/2` is `k = 0`). The engines transform
//! in natural order; [`FftBackend::inverse_centered`] applies the
//! `(-1)^(x+z)` checkerboard that undoes the half-grid shift.

mod radix2;
mod rustfft_backend;

use rayon::prelude::*;
use rustfft::num_complex::Complex32;

use crate::device::DeviceField;
use crate::error::ConfigError;
use crate::params::{FftBackendKind, MIN_RESOLUTION};

pub use radix2::SeparableFft;
pub use rustfft_backend::RustFftBackend;

/// Unnormalised inverse 2D transform of a fixed square size
pub trait FftBackend: Send {
    /// Grid side the backend was planned for
    fn resolution(&self) -> usize;

    /// Inverse transform in place, natural order in and out
    fn inverse_2d(&mut self, field: &mut [Complex32]);

    /// Inverse transform of a centred spectrum
    fn inverse_centered(&mut self, field: &mut [Complex32]) {
        self.inverse_2d(field);
        apply_checkerboard(field, self.resolution());
    }

    /// Transform every layer of a batched field independently
    fn inverse_layers(&mut self, field: &mut DeviceField<Complex32>) {
        for layer in 0..field.layers() {
            self.inverse_centered(field.read_mut(layer));
        }
    }
}

/// Plan a backend for an `n x n` grid
pub fn create_backend(kind: FftBackendKind, n: usize) -> Result<Box<dyn FftBackend>, ConfigError> {
    let backend: Box<dyn FftBackend> = match kind {
        FftBackendKind::Radix2 => Box::new(SeparableFft::new(n)?),
        FftBackendKind::RustFft => Box::new(RustFftBackend::new(n)?),
    };
    log::debug!("Planned {:?} inverse FFT at {}x{}", kind, n, n);
    Ok(backend)
}

pub(crate) fn validate_resolution(n: usize) -> Result<(), ConfigError> {
    if !n.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo(n));
    }
    if n < MIN_RESOLUTION {
        return Err(ConfigError::ResolutionTooSmall {
            got: n,
            min: MIN_RESOLUTION,
        });
    }
    Ok(())
}

/// `dst[x][z] = src[z][x]` for square row-major grids
pub(crate) fn transpose(src: &[Complex32], dst: &mut [Complex32], n: usize) {
    dst.par_chunks_mut(n).enumerate().for_each(|(row, out)| {
        for (col, value) in out.iter_mut().enumerate() {
            *value = src[col * n + row];
        }
    });
}

/// Multiply by `(-1)^(x+z)`
pub fn apply_checkerboard(field: &mut [Complex32], n: usize) {
    field.par_chunks_mut(n).enumerate().for_each(|(z, row)| {
        for (x, value) in row.iter_mut().enumerate() {
            if (x + z) % 2 == 1 {
                *value = -*value;
            }
        }
    });
}
