//! High-level ocean system: runs the per-frame pipeline and owns the published fields.

use std::path::Path;

use rustfft::num_complex::Complex32;

use super::compositor::composite;
use super::export::{export_surface, ExportedImages};
use super::field::OceanFields;
use super::probe::{DirectProbe, ProbeField, ProbeSource};
use super::surface::SurfaceModel;
use super::waves::AnalyticWaves;
use crate::buoyancy::{ReadbackQueue, SampleService};
use crate::device::DeviceField;
use crate::error::{ConfigError, SeaswellError};
use crate::fft::{create_backend, FftBackend};
use crate::params::{SimulationConfig, WaveModelConfig};
use crate::spectrum::{allocate_evolved, evolve_spectra, InitialSpectrum, SpectrumInputs};

/// Probe texels with at least this much foam count as covered
const FOAM_COVERAGE_THRESHOLD: f32 = 0.1;

/// Summary of one update, computed from the probe field
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub time_s: f32,
    pub mean_height_m: f32,
    pub min_height_m: f32,
    pub max_height_m: f32,
    /// Fraction of probe texels covered by foam
    pub foam_coverage: f32,
    /// Whether the initial spectrum was regenerated this frame
    pub regenerated: bool,
}

/// Spectral pipeline state: compile, evolve, transform, composite
struct SpectralPipeline {
    inputs: SpectrumInputs,
    initial: InitialSpectrum,
    spatial: DeviceField<Complex32>,
    fft: Box<dyn FftBackend>,
    fields: OceanFields,
}

impl SpectralPipeline {
    fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let fft = create_backend(config.fft_backend, config.resolution)?;
        let inputs = SpectrumInputs::from_config(config);
        let initial = InitialSpectrum::generate(config, &inputs.compiled, config.seed);

        Ok(Self {
            inputs,
            initial,
            spatial: allocate_evolved(config.resolution, config.cascades.len()),
            fft,
            fields: OceanFields::allocate(config),
        })
    }

    /// One frame. Returns whether the initial spectrum was regenerated.
    fn update(&mut self, config: &SimulationConfig, time_s: f32, reseed: Option<u64>) -> bool {
        let inputs = SpectrumInputs::from_config(config);
        let regenerate = reseed.is_some() || inputs != self.inputs;
        if regenerate {
            self.inputs = inputs;
            self.initial
                .regenerate(config, &self.inputs.compiled, reseed.unwrap_or(config.seed));
        }

        evolve_spectra(&self.initial, config, time_s, &mut self.spatial);
        self.fft.inverse_layers(&mut self.spatial);
        composite(&self.spatial, config, &mut self.fields);
        regenerate
    }
}

/// The wave strategy chosen at configuration time
enum Synthesis {
    Spectral(Box<SpectralPipeline>),
    Analytic(AnalyticWaves),
}

impl Synthesis {
    fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Ok(match &config.wave_model {
            WaveModelConfig::Spectral => Self::Spectral(Box::new(SpectralPipeline::new(config)?)),
            WaveModelConfig::Analytic { function, waves } => {
                Self::Analytic(AnalyticWaves::new(*function, waves))
            }
        })
    }

    fn surface(&self) -> &dyn SurfaceModel {
        match self {
            Self::Spectral(pipeline) => &pipeline.fields,
            Self::Analytic(waves) => waves,
        }
    }
}

/// Where readbacks read the surface from
enum ReadbackSource<'a> {
    /// Probe field over the primary tile, valid when every cascade tiles it
    Probe(&'a ProbeField),
    /// Direct evaluation for surfaces the probe field cannot wrap
    Direct(DirectProbe<'a>),
}

impl ProbeSource for ReadbackSource<'_> {
    fn probe(&self, world: glam::Vec2) -> super::ProbeTexel {
        match self {
            Self::Probe(field) => field.probe(world),
            Self::Direct(direct) => direct.probe(world),
        }
    }
}

/// Analytic surfaces and cascades that do not tile the primary tile are
/// evaluated directly; everything else reads the probe field
fn readback_source<'a>(
    config: &SimulationConfig,
    synthesis: &'a Synthesis,
    probe: &'a ProbeField,
    time_s: f32,
) -> ReadbackSource<'a> {
    match synthesis {
        Synthesis::Spectral(_) if config.cascades_tile_primary() => ReadbackSource::Probe(probe),
        synthesis => ReadbackSource::Direct(DirectProbe::new(synthesis.surface(), time_s)),
    }
}

/// Ocean simulation with published fields and a buoyancy readback queue
pub struct OceanSystem {
    config: SimulationConfig,
    synthesis: Synthesis,
    probe: ProbeField,
    readback: ReadbackQueue,
    time_s: f32,
    frame: u64,
    pending_seed: Option<u64>,
}

impl OceanSystem {
    /// Validate `config` and build every buffer
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let synthesis = Synthesis::new(&config)?;
        let probe = ProbeField::allocate(config.probe_resolution, config.primary_tile_m());
        let readback = ReadbackQueue::new(config.readback_latency_frames)?;

        log::info!(
            "Ocean ready: {}x{} grid, {} cascades, {:?} FFT, seed {}",
            config.resolution,
            config.resolution,
            config.cascades.len(),
            config.fft_backend,
            config.seed
        );

        Ok(Self {
            config,
            synthesis,
            probe,
            readback,
            time_s: 0.0,
            frame: 0,
            pending_seed: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn time_s(&self) -> f32 {
        self.time_s
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Replace the configuration; buffers are rebuilt only when their shape changes.
    ///
    /// Changes to anything the initial spectrum depends on (compiled spectra,
    /// seed, gravity, depth, length scales, cutoffs, band splitting) regenerate
    /// it on the next update.
    pub fn set_config(&mut self, config: SimulationConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let reshape = config.resolution != self.config.resolution
            || config.cascades.len() != self.config.cascades.len()
            || config.fft_backend != self.config.fft_backend
            || config.wave_model != self.config.wave_model;
        if reshape {
            self.synthesis = Synthesis::new(&config)?;
            log::info!("Rebuilt ocean pipeline for new configuration");
        }
        if config.probe_resolution != self.probe.resolution()
            || config.primary_tile_m() != self.probe.tile_m()
        {
            self.probe = ProbeField::allocate(config.probe_resolution, config.primary_tile_m());
        }
        self.readback.set_latency(config.readback_latency_frames)?;

        self.config = config;
        Ok(())
    }

    /// Regenerate the initial spectrum on the next update.
    ///
    /// Without a seed the configured seed is reused; a given seed becomes the new default.
    pub fn regenerate_spectrum(&mut self, seed: Option<u64>) {
        let seed = seed.unwrap_or(self.config.seed);
        self.config.seed = seed;
        self.pending_seed = Some(seed);
        log::debug!("Spectrum regeneration requested with seed {}", seed);
    }

    /// Advance by `dt_s` and run every stage of the frame in order
    pub fn update(&mut self, dt_s: f32) -> FrameStats {
        self.time_s += dt_s;
        self.frame += 1;

        let regenerated = match &mut self.synthesis {
            Synthesis::Spectral(pipeline) => {
                pipeline.update(&self.config, self.time_s, self.pending_seed.take())
            }
            Synthesis::Analytic(_) => {
                self.pending_seed = None;
                false
            }
        };

        self.probe.refresh(self.synthesis.surface(), self.time_s);
        let source = readback_source(&self.config, &self.synthesis, &self.probe, self.time_s);
        self.readback.resolve_frame(Some(&source));

        let mut stats = self.stats();
        stats.regenerated = regenerated;
        stats
    }

    /// Statistics of the current probe field
    pub fn stats(&self) -> FrameStats {
        let texels = self.probe.texels();
        let count = texels.len().max(1) as f32;
        let (sum, min, max, foamy) = texels.iter().fold(
            (0.0_f64, f32::INFINITY, f32::NEG_INFINITY, 0usize),
            |(sum, min, max, foamy), t| {
                (
                    sum + t.height as f64,
                    min.min(t.height),
                    max.max(t.height),
                    foamy + usize::from(t.foam >= FOAM_COVERAGE_THRESHOLD),
                )
            },
        );

        FrameStats {
            frame: self.frame,
            time_s: self.time_s,
            mean_height_m: (sum / count as f64) as f32,
            min_height_m: min,
            max_height_m: max,
            foam_coverage: foamy as f32 / count,
            regenerated: false,
        }
    }

    /// The active wave strategy
    pub fn surface(&self) -> &dyn SurfaceModel {
        self.synthesis.surface()
    }

    /// Published displacement/slope/foam fields (spectral model only)
    pub fn fields(&self) -> Option<&OceanFields> {
        match &self.synthesis {
            Synthesis::Spectral(pipeline) => Some(&pipeline.fields),
            Synthesis::Analytic(_) => None,
        }
    }

    /// Initial spectrum (spectral model only)
    pub fn initial_spectrum(&self) -> Option<&InitialSpectrum> {
        match &self.synthesis {
            Synthesis::Spectral(pipeline) => Some(&pipeline.initial),
            Synthesis::Analytic(_) => None,
        }
    }

    pub fn probe(&self) -> &ProbeField {
        &self.probe
    }

    /// Surface directly above a world position, as a readback would report it
    pub fn sample_now(&self, world_x: f32, world_z: f32) -> super::ProbeTexel {
        readback_source(&self.config, &self.synthesis, &self.probe, self.time_s)
            .probe(glam::Vec2::new(world_x, world_z))
    }

    /// Sampling service for buoyant bodies
    pub fn sample_service(&mut self) -> &mut dyn SampleService {
        &mut self.readback
    }

    pub fn readback(&mut self) -> &mut ReadbackQueue {
        &mut self.readback
    }

    /// Write height and foam PNGs of the primary tile into `dir`
    pub fn export_png(&self, dir: &Path) -> Result<ExportedImages, SeaswellError> {
        export_surface(
            self.surface(),
            self.time_s,
            self.config.primary_tile_m(),
            self.config.resolution,
            dir,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{CascadeConfig, DisplaySpectrum, FftBackendKind, WaveFunction, WaveParams};
    use crate::spectrum::compile_cascades;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            probe_resolution: 16,
            ..SimulationConfig::single_cascade(32, 64.0, DisplaySpectrum::default())
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimulationConfig {
            resolution: 96,
            ..small_config()
        };
        assert!(matches!(
            OceanSystem::new(config),
            Err(ConfigError::NotPowerOfTwo(96))
        ));
    }

    #[test]
    fn test_update_advances_time_and_produces_waves() {
        let mut ocean = OceanSystem::new(small_config()).unwrap();
        let stats = ocean.update(0.1);
        assert_eq!(stats.frame, 1);
        assert!((stats.time_s - 0.1).abs() < 1e-6);
        assert!(stats.max_height_m > stats.min_height_m);
        assert!(!stats.regenerated);
    }

    #[test]
    fn test_regenerate_takes_effect_next_update() {
        let mut ocean = OceanSystem::new(small_config()).unwrap();
        ocean.update(0.1);
        ocean.regenerate_spectrum(Some(99));
        assert_eq!(ocean.initial_spectrum().map(|s| s.seed()), Some(42));
        let stats = ocean.update(0.1);
        assert!(stats.regenerated);
        assert_eq!(ocean.initial_spectrum().map(|s| s.seed()), Some(99));
        assert_eq!(ocean.config().seed, 99);
    }

    #[test]
    fn test_parameter_change_triggers_regeneration() {
        let mut ocean = OceanSystem::new(small_config()).unwrap();
        ocean.update(0.1);
        let mut config = ocean.config().clone();
        config.cascades[0].spectra[0].wind_speed_m_per_s = 4.0;
        ocean.set_config(config).unwrap();
        assert!(ocean.update(0.1).regenerated);
        assert!(!ocean.update(0.1).regenerated);
    }

    #[test]
    fn test_backends_produce_same_surface() {
        let mut radix2 = OceanSystem::new(small_config()).unwrap();
        let mut reference = OceanSystem::new(SimulationConfig {
            fft_backend: FftBackendKind::RustFft,
            ..small_config()
        })
        .unwrap();
        radix2.update(0.5);
        reference.update(0.5);
        for (a, b) in radix2.probe().texels().iter().zip(reference.probe().texels()) {
            assert!((a.height - b.height).abs() < 1e-3);
        }
    }

    #[test]
    fn test_analytic_model_has_no_spectral_fields() {
        let config = SimulationConfig {
            wave_model: WaveModelConfig::Analytic {
                function: WaveFunction::Gerstner,
                waves: vec![WaveParams::default()],
            },
            ..small_config()
        };
        let mut ocean = OceanSystem::new(config).unwrap();
        ocean.update(0.25);
        assert!(ocean.fields().is_none());
        let expected = crate::ocean::surface::displaced_sample(
            ocean.surface(),
            glam::Vec2::new(1.0, 2.0),
            0.25,
        );
        assert!((ocean.sample_now(1.0, 2.0).height - expected.height()).abs() < 1e-6);
    }

    #[test]
    fn test_depth_and_length_change_regenerates_spectrum() {
        let mut ocean = OceanSystem::new(small_config()).unwrap();
        ocean.update(0.1);
        let mut config = ocean.config().clone();
        config.depth_m = 1.0;
        config.cascades[0].length_scale_m = 32.0;
        ocean.set_config(config.clone()).unwrap();
        assert!(ocean.update(0.1).regenerated);

        let fresh = InitialSpectrum::generate(&config, &compile_cascades(&config), config.seed);
        let live = ocean.initial_spectrum().unwrap();
        assert_eq!(live.layer(0), fresh.layer(0));
        assert!(!ocean.update(0.1).regenerated);
    }

    #[test]
    fn test_readback_across_tile_boundary_with_uneven_cascades() {
        let mut config = SimulationConfig {
            split_cascade_bands: false,
            readback_latency_frames: 1,
            ..small_config()
        };
        config.cascades = vec![
            CascadeConfig {
                length_scale_m: 256.0,
                ..config.cascades[0]
            },
            CascadeConfig {
                length_scale_m: 100.0,
                ..config.cascades[0]
            },
        ];
        assert!(!config.cascades_tile_primary());

        let mut ocean = OceanSystem::new(config).unwrap();
        let handle = ocean.sample_service().request_sample(272.0, 3.0);
        ocean.update(0.5);
        let poll = ocean.sample_service().poll_sample(handle);
        assert!(poll.ready);

        let at = |x: f32| {
            crate::ocean::surface::displaced_sample(ocean.surface(), glam::Vec2::new(x, 3.0), 0.5)
                .height()
        };
        assert!((poll.height - at(272.0)).abs() < 1e-4);
        assert!((ocean.sample_now(272.0, 3.0).height - at(272.0)).abs() < 1e-4);
        // The wrapped position is a different place on this sea
        assert!((at(272.0) - at(16.0)).abs() > 1e-3);
    }

    #[test]
    fn test_readback_reads_tiled_field_when_cascades_tile() {
        let mut ocean = OceanSystem::new(small_config()).unwrap();
        ocean.update(0.3);
        let world = glam::Vec2::new(64.0 + 12.0, -5.0);
        assert_eq!(ocean.sample_now(world.x, world.y), ocean.probe().probe(world));
    }
}
