//! Error types for configuration, readback queries and the binary.

/// Configuration rejected at initialization or regeneration.
///
/// These are never raised from inside a simulation tick.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid resolution is not a power of two
    #[error("grid resolution must be a power of two, got {0}")]
    NotPowerOfTwo(usize),
    /// Grid resolution below the smallest usable size
    #[error("grid resolution must be at least {min}, got {got}")]
    ResolutionTooSmall { got: usize, min: usize },
    /// Wind speed negative or not finite
    #[error("cascade {cascade} layer {layer}: wind speed must be finite and >= 0, got {value}")]
    InvalidWindSpeed { cascade: usize, layer: usize, value: f32 },
    /// Fetch zero, negative or not finite
    #[error("cascade {cascade} layer {layer}: fetch must be finite and > 0, got {value}")]
    InvalidFetch { cascade: usize, layer: usize, value: f32 },
    /// Cascade count outside 1..=4
    #[error("cascade count must be between 1 and {max}, got {got}")]
    InvalidCascadeCount { got: usize, max: usize },
    /// Cascade tile length or tile factor not strictly positive
    #[error("cascade {cascade}: length scale and tile must be > 0")]
    InvalidLengthScale { cascade: usize },
    /// A direction vector with zero or non-finite length
    #[error("{what}: direction vector is degenerate")]
    DegenerateDirection { what: String },
    /// A low/high pair where low is not below high
    #[error("{what}: expected low < high, got [{low}, {high}]")]
    InvalidRange { what: &'static str, low: f32, high: f32 },
    /// A parameter that must be strictly positive and finite
    #[error("{what} must be finite and > 0, got {value}")]
    NonPositive { what: &'static str, value: f32 },
    /// A parameter that must lie in [0, 1]
    #[error("{what} must be within [0, 1], got {value}")]
    OutOfUnitRange { what: &'static str, value: f32 },
    /// Readback latency outside 1..=3 frames
    #[error("readback latency must be 1..=3 frames, got {0}")]
    InvalidLatency(u32),
    /// Sample history too short to interpolate
    #[error("sample history needs at least 2 entries, got {0}")]
    HistoryTooShort(usize),
    /// Voxel size outside (0, 1] of the body's smallest extent
    #[error("normalized voxel size must be within (0, 1], got {0}")]
    InvalidVoxelSize(f32),
    /// Body density zero, negative or not finite
    #[error("body density must be finite and > 0, got {0}")]
    InvalidDensity(f32),
    /// Too many analytic waves
    #[error("at most {max} analytic waves are supported, got {got}")]
    TooManyWaves { got: usize, max: usize },
}

/// Failure reported by a field readback.
///
/// Recovered locally by the voxel that issued the query.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    /// The readback itself failed
    #[error("readback failed")]
    Readback,
    /// Query position was NaN or infinite
    #[error("query position is not finite")]
    NonFinitePosition,
    /// No field has been published yet
    #[error("no field published")]
    NoField,
    /// Handle was never issued or already consumed
    #[error("unknown query handle")]
    UnknownHandle,
}

/// Top-level error for the binary and file-based configuration.
#[derive(thiserror::Error, Debug)]
pub enum SeaswellError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("config serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("image export error: {0}")]
    Image(#[from] image::ImageError),
}
