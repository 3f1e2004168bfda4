use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Fewer than 3 measurements (or scatter samples) were gathered
    /// for the requested operation: nothing is attempted.
    #[error("insufficient data: {0} measurements (3 required)")]
    InsufficientData(usize),

    /// None of the optimizer restarts converged.
    #[error("no optimizer restart converged")]
    ConvergenceFailure,

    /// The optimizer converged, but the solution lies too far away
    /// from the measurements to be physically plausible.
    /// Carries the maximal distance (in length units).
    #[error("rejected solution: {0:.1} length units away from measurements")]
    ValidationFailure(f64),

    /// Every interpolation strategy failed. The heatmap pipeline
    /// recovers from this by splatting samples directly.
    #[error("all interpolation strategies exhausted")]
    InterpolationFailure,

    /// Value range is degenerate (max == min). The heatmap pipeline
    /// recovers from this by widening the range.
    #[error("degenerate value range")]
    DegenerateRange,

    /// Scattered points do not span a surface (less than 3 distinct,
    /// non collinear positions).
    #[error("failed to triangulate scattered points")]
    Triangulation,

    #[error("failed to invert matrix")]
    MatrixInversion,

    #[error("invalid position: coordinates must be finite")]
    InvalidPosition,

    #[error("invalid signal level: must be finite")]
    InvalidSignal,

    /// Calibration scale must be finite and strictly positive.
    #[error("invalid scale {0}")]
    InvalidScale(f64),

    #[error("invalid emitter identifier \"{0}\"")]
    InvalidEmitterId(String),

    #[error("invalid raster size {0}x{1}")]
    InvalidRasterSize(usize, usize),
}
