//! Spatial interpolation and heatmap rendering
use log::{debug, warn};
use nalgebra::{DMatrix, Vector2};

mod colors;
mod interpolation;
mod legend;
mod mask;
mod metric;
mod raster;
mod triangulation;

pub use colors::{ColorRamp, Rgb};
pub use legend::LegendMetadata;
pub use metric::{Metric, MetricFamily, ScatterSample, ValueRange};
pub use raster::{Raster, Rgba};

use interpolation::{cubic, linear_fill, merge_duplicates, nearest_fill, radial_basis, Grid};
use mask::Proximity;
use triangulation::Triangulation;

use crate::{
    cfg::{Config, HeatmapOpts},
    constants::MIN_MEASUREMENTS,
    error::Error,
    survey::{EmitterId, Survey},
};

/// Interpolation stage that produced a [Heatmap]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Not enough samples: nothing to interpolate
    Transparent,
    /// Cubic patches resolved every cell
    Cubic,
    /// Some cells required the linear stage
    Linear,
    /// Some cells required nearest neighbour filling
    Nearest,
    /// Triangulation failed, radial basis functions were used
    RadialBasis,
    /// Every interpolation failed, samples were splatted
    Splat,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Transparent => write!(f, "transparent"),
            Self::Cubic => write!(f, "cubic"),
            Self::Linear => write!(f, "linear"),
            Self::Nearest => write!(f, "nearest"),
            Self::RadialBasis => write!(f, "rbf"),
            Self::Splat => write!(f, "splat"),
        }
    }
}

/// Rendered heatmap
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    /// [Raster], at requested size
    pub raster: Raster,
    /// [LegendMetadata] describing the [Raster]
    pub legend: LegendMetadata,
    /// [Method] that produced the [Raster]
    pub method: Method,
}

/// [HeatmapGenerator] turns scattered samples into colored,
/// confidence weighted rasters. It retains no state between renders.
#[derive(Debug, Clone)]
pub struct HeatmapGenerator {
    opts: HeatmapOpts,
}

impl HeatmapGenerator {
    pub fn new(cfg: &Config) -> Self {
        Self {
            opts: cfg.heatmap.clone(),
        }
    }

    /// Renders this [Metric] over the [Survey].
    /// Signal metrics are read from the `target` emitter, when specified,
    /// otherwise from the strongest emitter at each location.
    pub fn render(
        &self,
        survey: &Survey,
        metric: Metric,
        target: Option<&EmitterId>,
        width: usize,
        height: usize,
    ) -> Result<Heatmap, Error> {
        let samples = ScatterSample::collect(survey, &metric, target);
        self.render_samples(&samples, metric, width, height)
    }

    /// Renders these [ScatterSample]s, interpreted as this [Metric].
    /// Only an invalid raster size is reported as an error: poor inputs
    /// degrade through the interpolation stages instead.
    pub fn render_samples(
        &self,
        samples: &[ScatterSample],
        metric: Metric,
        width: usize,
        height: usize,
    ) -> Result<Heatmap, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidRasterSize(width, height));
        }

        let range = ValueRange::determine(&metric, samples, self.opts.range_padding);
        let ramp = ColorRamp::new(metric.family());
        let legend = LegendMetadata::for_metric(&metric, &range);

        if samples.len() < MIN_MEASUREMENTS {
            debug!("{}: {} samples: transparent heatmap", metric, samples.len());
            return Ok(Heatmap {
                raster: Raster::transparent(width, height, range, ramp.is_inverted()),
                legend,
                method: Method::Transparent,
            });
        }

        let grid = Grid::new(width, height, &self.opts);
        let (points, values) = merge_duplicates(samples);
        let proximity = Proximity::new(&points, &grid);

        let (raster, method) = match self.interpolate(&points, &values, &proximity, &grid) {
            Ok((z, method)) => {
                let alpha = proximity.alpha(width, height, &self.opts);
                let pixels = z
                    .transpose()
                    .iter()
                    .zip(alpha.iter())
                    .map(|(value, alpha)| {
                        Rgba::new(
                            ramp.color(range.normalize(*value)),
                            (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
                        )
                    })
                    .collect::<Vec<_>>();

                let coarse = Raster::from_pixels(
                    grid.cols(),
                    grid.rows(),
                    pixels,
                    range,
                    ramp.is_inverted(),
                )?;

                (coarse.resample(width, height)?, method)
            },
            Err(e) => {
                warn!("{}: interpolation failed ({}): splatting samples", metric, e);
                let raster = Raster::splat(
                    samples,
                    width,
                    height,
                    range,
                    &ramp,
                    self.opts.splat_divider,
                    self.opts.splat_opacity,
                )?;
                (raster, Method::Splat)
            },
        };

        debug!(
            "{}: {}x{} heatmap ({}), range [{:.1}, {:.1}]",
            metric, width, height, method, range.min, range.max
        );

        Ok(Heatmap {
            raster,
            legend,
            method,
        })
    }

    /// Interpolation chain. Returns the (rows, cols) value grid
    /// and the lowest order stage it required.
    fn interpolate(
        &self,
        points: &[Vector2<f64>],
        values: &[f64],
        proximity: &Proximity,
        grid: &Grid,
    ) -> Result<(DMatrix<f64>, Method), Error> {
        let tri = match Triangulation::new(points) {
            Ok(tri) => tri,
            Err(e) => {
                debug!("{}: radial basis fallback", e);
                let z = radial_basis(points, values, grid, self.opts.rbf_smoothing)
                    .map_err(|e| {
                        debug!("radial basis interpolation: {}", e);
                        Error::InterpolationFailure
                    })?;
                return Ok((z, Method::RadialBasis));
            },
        };

        let mut z = cubic(&tri, values, grid);
        let mut method = Method::Cubic;

        if z.iter().any(|v| !v.is_finite()) {
            if linear_fill(&tri, values, grid, &mut z) > 0 {
                debug!("cubic stage left cells unresolved: linear fill");
                method = Method::Linear;
            }
            if nearest_fill(values, &proximity.index, grid, &mut z) > 0 {
                debug!("cells outside of the convex hull: nearest fill");
                method = Method::Nearest;
            }
        }

        Ok((z, method))
    }
}
