use crate::heatmap::{
    colors::{ColorRamp, Rgb},
    metric::{Metric, ValueRange},
};

/// Describes how to read a [Raster](crate::prelude::Raster)
#[derive(Debug, Clone, PartialEq)]
pub struct LegendMetadata {
    pub metric_name: String,
    pub unit: String,
    /// Lower bound of the value range, formatted with its unit
    pub range_low_label: String,
    /// Upper bound of the value range, formatted with its unit
    pub range_high_label: String,
    /// Color stops, positioned along the value axis:
    /// 0 is the lower bound, 1 the upper bound.
    pub color_stops: Vec<(f64, Rgb)>,
}

impl LegendMetadata {
    pub fn for_metric(metric: &Metric, range: &ValueRange) -> Self {
        let ramp = ColorRamp::new(metric.family());
        let unit = metric.unit();

        let mut color_stops = ramp
            .stops()
            .iter()
            .map(|(pos, color)| {
                if ramp.is_inverted() {
                    (1.0 - pos, *color)
                } else {
                    (*pos, *color)
                }
            })
            .collect::<Vec<_>>();

        color_stops.sort_by(|a, b| a.0.total_cmp(&b.0));

        Self {
            metric_name: metric.name().to_string(),
            unit: unit.to_string(),
            range_low_label: format!("{:.0} {}", range.min, unit),
            range_high_label: format!("{:.0} {}", range.max, unit),
            color_stops,
        }
    }
}
