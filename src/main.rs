//! Seaswell - headless spectral ocean simulation
//!
//! Runs the ocean pipeline with one floating probe body and logs
//! per-second statistics of the surface and the body.

use clap::Parser;
use glam::Vec3;

use seaswell::buoyancy::{BuoyantBody, RigidBody};
use seaswell::cli::{write_config, Args};
use seaswell::error::SeaswellError;
use seaswell::ocean::OceanSystem;

/// Probe body: a 4m x 1m x 2m box
const PROBE_HALF_EXTENTS: Vec3 = Vec3::new(2.0, 0.5, 1.0);
const PROBE_MASS_KG: f32 = 2000.0;

fn run(args: &Args) -> Result<(), SeaswellError> {
    let config = args.load_config()?;
    if let Some(path) = &args.dump_config {
        write_config(&config, path)?;
        log::info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let mut ocean = OceanSystem::new(config)?;
    let body = RigidBody::solid_box(PROBE_MASS_KG, PROBE_HALF_EXTENTS);
    let mut probe = BuoyantBody::new(body, PROBE_HALF_EXTENTS, args.buoyancy_config())?;
    probe.enable(Some(ocean.sample_service()));

    let ticks_per_second = (1.0 / args.dt).round().max(1.0) as u32;
    for tick in 1..=args.ticks {
        let stats = ocean.update(args.dt);
        let report = probe.tick(args.dt, Some(ocean.sample_service()));

        if tick % ticks_per_second == 0 || tick == args.ticks {
            log::info!(
                "t={:.2}s height mean {:+.3} min {:+.3} max {:+.3} m, foam {:.1}%, body y {:+.3} m, submerged {:.0}%",
                stats.time_s,
                stats.mean_height_m,
                stats.min_height_m,
                stats.max_height_m,
                stats.foam_coverage * 100.0,
                probe.body.position.y,
                report.submerged_fraction * 100.0
            );
        }
    }

    probe.disable(Some(ocean.sample_service()));
    if let Some(dir) = &args.export {
        ocean.export_png(dir)?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
