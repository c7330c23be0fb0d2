//! Physical and numerical constants shared across the crate.

/// Standard gravity used by the ideal rocket equation [m/s²].
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Earth gravitational parameter (EGM2008) [m³/s²].
pub const EARTH_GRAVITATIONAL_PARAMETER: f64 = 3.986004418e14;

/// Default segment duration budget: 30 days [s].
pub const DEFAULT_SEGMENT_DURATION: f64 = 30.0 * 86_400.0;

/// Default time tolerance of the event root solver [s].
pub const DEFAULT_ROOT_TOLERANCE: f64 = 1e-7;

/// Default iteration cap of the event root solver.
pub const DEFAULT_ROOT_ITERATIONS: usize = 100;
