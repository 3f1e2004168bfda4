//! Confidence (alpha) mask
use nalgebra::Vector2;

use crate::{cfg::HeatmapOpts, heatmap::interpolation::Grid};

/// Closest sample to each grid cell (row major)
#[derive(Debug, Clone)]
pub(crate) struct Proximity {
    /// Closest sample index
    pub index: Vec<usize>,
    /// Distance to the closest sample, in raster units
    pub distance: Vec<f64>,
}

impl Proximity {
    pub fn new(points: &[Vector2<f64>], grid: &Grid) -> Self {
        let cells = grid.rows() * grid.cols();
        let (mut index, mut distance) = (Vec::with_capacity(cells), Vec::with_capacity(cells));

        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let p = grid.point(row, col);
                let (nth, dist) = points
                    .iter()
                    .map(|q| (p - q).norm())
                    .enumerate()
                    .fold((0, f64::INFINITY), |best, (nth, dist)| {
                        if dist < best.1 {
                            (nth, dist)
                        } else {
                            best
                        }
                    });
                index.push(nth);
                distance.push(dist);
            }
        }

        Self { index, distance }
    }

    /// Opacity of each cell (row major), within [0, 1].
    /// Within the influence radius, opacity decays quadratically from
    /// the ceiling down to the floor. Beyond, cells get the background opacity.
    pub fn alpha(&self, width: usize, height: usize, opts: &HeatmapOpts) -> Vec<f64> {
        let radius = opts.influence_ratio * width.min(height) as f64;

        self.distance
            .iter()
            .map(|&d| {
                if d < radius {
                    let r = 1.0 - d / radius;
                    opts.alpha_floor + (opts.alpha_ceiling - opts.alpha_floor) * r * r
                } else {
                    opts.alpha_background
                }
            })
            .collect()
    }
}
