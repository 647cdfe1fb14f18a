//! Wave spectrum: parameter compilation, initial spectrum and time evolution.

mod compile;
mod evolve;
mod initial;
mod jonswap;
mod random;

pub use compile::{
    compile_cascades, compile_layer, jonswap_alpha, jonswap_peak_omega, MIN_WIND_SPEED_M_PER_S,
};
pub use evolve::{
    allocate_evolved, evolve_height, evolve_spectra, looped_dispersion, packed_value,
    PackedSpectrum, PACKED_PER_CASCADE,
};
pub use initial::{mirror_index, wavevector, InitialSpectrum, SpectrumBin, SpectrumInputs};
pub use jonswap::{dispersion, dispersion_derivative, jonswap};
