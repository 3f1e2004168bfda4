use nalgebra::Vector2;

use crate::{locator::PositionReport, survey::EmitterId};

/// [EmitterEstimate] status
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Status {
    /// Solved and passed the solver sanity checks
    #[default]
    Estimated,
    /// Solved, but later rejected by [PositionReport] validation
    Rejected,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Estimated => write!(f, "estimated"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Estimated emitter position
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterEstimate {
    /// [EmitterId]
    pub id: EmitterId,
    /// Display label
    pub label: String,
    /// Position, in raster units
    pub position: Vector2<f64>,
    /// Confidence within [0, 1]
    pub confidence: f64,
    /// Number of measurements gathered for this emitter
    pub measurement_count: usize,
    /// Average signal level [dBm]
    pub average_signal_dbm: f64,
    /// [Status]
    pub status: Status,
}

impl EmitterEstimate {
    /// Returns a copy of this estimate, marked [Status::Rejected]
    /// if the [PositionReport] is not valid.
    pub fn checked(&self, report: &PositionReport) -> Self {
        let mut s = self.clone();
        if !report.is_valid() {
            s.status = Status::Rejected;
        }
        s
    }
}

impl std::fmt::Display for EmitterEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} \"{}\" pos=({:.1}, {:.1}) conf={:.1}% ({})",
            self.id,
            self.label,
            self.position.x,
            self.position.y,
            self.confidence * 100.0,
            self.status
        )
    }
}
