//! Seaswell library - spectral ocean simulation with buoyancy queries

pub mod buoyancy;
pub mod cli;
pub mod device;
pub mod error;
pub mod fft;
pub mod ocean;
pub mod params;
pub mod spectrum;
