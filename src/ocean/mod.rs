//! Ocean surface synthesis: compositing, published fields, probe and strategies.

mod compositor;
mod export;
mod field;
mod probe;
mod surface;
mod system;
mod waves;

pub use compositor::{accumulate_foam, composite, foam_source, CascadeTexel};
pub use export::{export_surface, ExportedImages};
pub use field::{
    cascade_weights, depth_attenuation, sample_bilinear, CascadeWeights, MipChain, OceanFields,
    Texel,
};
pub use probe::{DirectProbe, ProbeField, ProbeSource, ProbeTexel};
pub use surface::{displaced_sample, SurfaceModel, SurfaceSample, DISPLACEMENT_INVERSION_STEPS};
pub use system::{FrameStats, OceanSystem};
pub use waves::AnalyticWaves;
