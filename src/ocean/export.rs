//! PNG snapshots of the composite surface.

use std::path::{Path, PathBuf};

use glam::Vec2;
use rayon::prelude::*;

use super::probe::ProbeTexel;
use super::surface::{displaced_sample, SurfaceModel};
use crate::error::SeaswellError;

/// Files written by [`export_surface`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImages {
    pub height: PathBuf,
    pub foam: PathBuf,
}

/// Height mapped to 0-255 over its own range; flat input maps to mid grey
fn normalize_heights(samples: &[ProbeTexel]) -> Vec<u8> {
    let (min, max) = samples.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.height), hi.max(s.height))
    });
    let range = max - min;
    samples
        .iter()
        .map(|s| {
            if range > 1e-6 {
                ((s.height - min) / range * 255.0).round() as u8
            } else {
                128
            }
        })
        .collect()
}

/// Write `height.png` and `foam.png` covering one `tile_m` tile at `size x size` pixels
pub fn export_surface(
    model: &dyn SurfaceModel,
    time_s: f32,
    tile_m: f32,
    size: usize,
    dir: &Path,
) -> Result<ExportedImages, SeaswellError> {
    std::fs::create_dir_all(dir)?;

    let spacing = tile_m / size as f32;
    let samples: Vec<ProbeTexel> = (0..size * size)
        .into_par_iter()
        .map(|i| {
            let world = Vec2::new((i % size) as f32, (i / size) as f32) * spacing;
            ProbeTexel::from_sample(&displaced_sample(model, world, time_s))
        })
        .collect();

    let heights = normalize_heights(&samples);
    let foam: Vec<u8> = samples
        .iter()
        .map(|s| (s.foam.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    let images = ExportedImages {
        height: dir.join("height.png"),
        foam: dir.join("foam.png"),
    };
    let side = size as u32;
    image::save_buffer(&images.height, &heights, side, side, image::ColorType::L8)?;
    image::save_buffer(&images.foam, &foam, side, side, image::ColorType::L8)?;

    log::info!(
        "Exported {}x{} surface to {} and {}",
        size,
        size,
        images.height.display(),
        images.foam.display()
    );
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spans_full_range() {
        let texel = |height| ProbeTexel {
            height,
            ..ProbeTexel::default()
        };
        let bytes = normalize_heights(&[texel(-1.0), texel(0.0), texel(1.0)]);
        assert_eq!(bytes, vec![0, 128, 255]);
        assert_eq!(normalize_heights(&[texel(2.0), texel(2.0)]), vec![128, 128]);
    }
}
