#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod averager;
mod cfg;
mod confidence;
mod constants;
mod error;
mod heatmap;
mod locator;
mod measurements;
mod pathloss;
mod survey;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::cfg::{Config, Environment, HeatmapOpts, PathLoss, ScoringOpts, SolverOpts};
    pub use crate::confidence::ConfidenceScorer;
    pub use crate::error::Error;
    pub use crate::heatmap::{
        ColorRamp, Heatmap, HeatmapGenerator, LegendMetadata, Method, Metric, MetricFamily,
        Raster, Rgb, Rgba, ScatterSample, ValueRange,
    };
    pub use crate::locator::{
        EmitterEstimate, InvalidationCause, Locator, PositionReport, Status,
    };
    pub use crate::measurements::{EmitterMeasurements, Measurement};
    pub use crate::pathloss::SignalDistanceModel;
    pub use crate::survey::{
        Band, EmitterId, Observation, PerformanceGrade, SignalCategory, Survey, SurveyPoint,
        ThroughputProbe,
    };
    // re-export
    pub use hifitime::Epoch;
    pub use nalgebra::Vector2;
}

// pub export
pub use error::Error;
