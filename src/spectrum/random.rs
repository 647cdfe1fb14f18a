//! Deterministic per-bin Gaussian samples.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// SplitMix64 finaliser
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seed for one wavenumber bin, independent of visiting order
pub fn bin_seed(seed: u64, cascade: usize, x: usize, z: usize) -> u64 {
    let mut h = mix64(seed ^ 0x9e37_79b9_7f4a_7c15);
    h = mix64(h ^ cascade as u64);
    h = mix64(h ^ x as u64);
    mix64(h ^ ((z as u64) << 32))
}

/// Two independent standard normal samples
pub fn gaussian_pair<R: Rng>(rng: &mut R) -> (f32, f32) {
    (rng.sample(StandardNormal), rng.sample(StandardNormal))
}

/// Gaussian pair for a bin
pub fn bin_gaussian(seed: u64, cascade: usize, x: usize, z: usize) -> (f32, f32) {
    let mut rng = ChaCha8Rng::seed_from_u64(bin_seed(seed, cascade, x, z));
    gaussian_pair(&mut rng)
}
