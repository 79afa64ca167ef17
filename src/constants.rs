//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants (e.g. minimum input length) from primary ones to avoid
//! drift.
//!
//! # Tower Geometry
//!
//! The convolutional half of the embedding tower is fixed: two valid convolutions of width
//! [`CONV_KERNEL_SIZE`], each followed by a max-pool of [`POOL_WINDOW`]. Only the dense half
//! is tuned. Use [`validate_feature_dim`] at module boundaries to reject inputs that would
//! collapse to zero spatial length.

/// Output channels of the first convolution block.
pub const CONV1_CHANNELS: usize = 64;
/// Output channels of the second convolution block.
pub const CONV2_CHANNELS: usize = 128;
pub const CONV_KERNEL_SIZE: usize = 3;
pub const POOL_WINDOW: usize = 2;

/// Smallest feature length that survives both conv/pool blocks.
pub const MIN_FEATURE_DIM: usize = {
    // conv2 must leave at least POOL_WINDOW positions: p1 - (k - 1) >= POOL_WINDOW
    let p1 = POOL_WINDOW + CONV_KERNEL_SIZE - 1;
    // conv1 output must pool to p1: (L - (k - 1)) / POOL_WINDOW >= p1
    p1 * POOL_WINDOW + CONV_KERNEL_SIZE - 1
};

/// Added under the square root of the pair distance so its gradient stays finite.
pub const DISTANCE_EPSILON: f64 = 1e-12;

pub const DEFAULT_BATCH_SIZE: usize = 128;
pub const DEFAULT_SHUFFLE_BUFFER: usize = 1024;
pub const DEFAULT_TRAIN_EPOCHS: usize = 20;

/// Distance below which a pair is predicted to be the same entity.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.5;

pub const DEFAULT_MAX_EPOCHS: usize = 20;
pub const DEFAULT_HYPERBAND_FACTOR: usize = 3;
pub const DEFAULT_HYPERBAND_ITERATIONS: usize = 2;

pub const DEFAULT_SEED: u64 = 42;

/// Columns with a larger missing-value ratio than this are dropped during preparation.
pub const DROP_NA_THRESHOLD: f64 = 0.6;

/// Error returned when a feature length cannot feed the embedding tower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Feature length cannot be zero.
    ZeroDimension,
    /// Feature length collapses to nothing after the conv/pool stack.
    TooShort { dim: usize, min: usize },
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "feature dimension cannot be zero"),
            Self::TooShort { dim, min } => {
                write!(
                    f,
                    "feature dimension {} is too short for the conv/pool stack (min {})",
                    dim, min
                )
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a feature length can pass through the embedding tower.
pub fn validate_feature_dim(dim: usize) -> Result<(), DimValidationError> {
    if dim == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if dim < MIN_FEATURE_DIM {
        return Err(DimValidationError::TooShort {
            dim,
            min: MIN_FEATURE_DIM,
        });
    }
    Ok(())
}

/// Validates that a runtime feature length matches the expected one.
pub fn validate_matching_dim(expected: usize, actual: usize) -> Result<(), DimValidationError> {
    if expected != actual {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
