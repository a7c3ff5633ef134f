//! Shared constants.

/// Number of coordinated axes (X, Y, Z, A, B, C, U, V, W).
pub const AXIS_COUNT: usize = 9;

/// Deltas smaller than this are treated as no motion on that axis.
pub const TINY: f64 = 1e-7;

/// Stationary-axis sentinel for min-of-maxima envelope folds.
pub const STATIONARY: f64 = 1e9;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Millimeters per centimeter.
pub const MM_PER_CM: f64 = 10.0;

/// Maximum number of points the segment fusion chain may hold.
pub const MAX_CHAINED_SEGMENTS: usize = 100;

/// Number of motion-synchronized digital I/O channels.
pub const MAX_DIGITAL_IO: usize = 64;

/// Number of motion-synchronized analog I/O channels.
pub const MAX_ANALOG_IO: usize = 16;

/// Default tool table capacity (pocket 0 is the spindle).
pub const DEFAULT_POCKETS_MAX: usize = 56;

/// Bounded retry count for biarc step perturbation.
pub const BIARC_MAX_RETRIES: u32 = 32;
