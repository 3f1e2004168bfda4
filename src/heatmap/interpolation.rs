//! Scattered data interpolation stages
use log::{debug, trace};
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use crate::{
    averager::Averager,
    cfg::HeatmapOpts,
    error::Error,
    heatmap::{metric::ScatterSample, triangulation::Triangulation},
};

/// Positions closer than this (raster units) are merged
const MERGE_DISTANCE: f64 = 1.0E-6;

/// Vertex neighbourhoods whose normal matrix has a lower
/// reciprocal condition number do not define a gradient.
const MIN_CONDITIONING: f64 = 1.0E-3;

/// Coarse interpolation grid, spanning the complete raster
#[derive(Debug, Clone)]
pub(crate) struct Grid {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

fn linspace(end: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| end * i as f64 / (n - 1) as f64).collect()
}

impl Grid {
    pub fn new(width: usize, height: usize, opts: &HeatmapOpts) -> Self {
        let divider = opts.grid_divider.max(1);
        let max_grid = opts.max_grid.max(2);

        let cols = (width / divider).clamp(2, max_grid);
        let rows = (height / divider).clamp(2, max_grid);

        Self {
            xs: linspace(width as f64, cols),
            ys: linspace(height as f64, rows),
        }
    }

    pub fn cols(&self) -> usize {
        self.xs.len()
    }

    pub fn rows(&self) -> usize {
        self.ys.len()
    }

    /// Raster coordinates of this cell
    pub fn point(&self, row: usize, col: usize) -> Vector2<f64> {
        Vector2::new(self.xs[col], self.ys[row])
    }
}

/// Merges samples sharing a position, averaging their values.
pub(crate) fn merge_duplicates(samples: &[ScatterSample]) -> (Vec<Vector2<f64>>, Vec<f64>) {
    let mut merged = Vec::<(Vector2<f64>, Averager)>::with_capacity(samples.len());

    for sample in samples {
        match merged
            .iter_mut()
            .find(|(pos, _)| (pos - sample.position).norm() < MERGE_DISTANCE)
        {
            Some((_, avg)) => avg.add(sample.value),
            None => {
                let mut avg = Averager::new();
                avg.add(sample.value);
                merged.push((sample.position, avg));
            },
        }
    }

    if merged.len() < samples.len() {
        debug!("merged {} duplicate positions", samples.len() - merged.len());
    }

    merged.into_iter().map(|(pos, avg)| (pos, avg.mean)).unzip()
}

/// Vertex gradients, estimated by inverse distance weighted least squares
/// over the Delaunay neighbours. Flat neighbourhoods do not constrain
/// the gradient: those vertices have none.
fn gradients(tri: &Triangulation, values: &[f64]) -> Vec<Option<Vector2<f64>>> {
    let points = tri.points();

    tri.neighbours()
        .iter()
        .enumerate()
        .map(|(i, neighbours)| {
            let mut ata = Matrix2::<f64>::zeros();
            let mut atb = Vector2::<f64>::zeros();

            for &j in neighbours {
                let dp = points[j] - points[i];
                let dist_sq = dp.norm_squared();
                if dist_sq > 0.0 {
                    let w = 1.0 / dist_sq;
                    ata += dp * dp.transpose() * w;
                    atb += dp * (values[j] - values[i]) * w;
                }
            }

            let eigen = ata.symmetric_eigenvalues();
            let (min, max) = (eigen.min(), eigen.max());

            if !(max > 0.0) || min / max < MIN_CONDITIONING {
                trace!("vertex #{}: ill conditioned neighbourhood", i);
                return None;
            }

            ata.try_inverse().map(|inv| inv * atb)
        })
        .collect()
}

/// Cubic Bézier triangular patch, its control net
/// built from vertex values and gradients.
struct Patch {
    b300: f64,
    b030: f64,
    b003: f64,
    b210: f64,
    b120: f64,
    b201: f64,
    b102: f64,
    b021: f64,
    b012: f64,
    b111: f64,
}

impl Patch {
    fn new(p: [Vector2<f64>; 3], f: [f64; 3], g: [Vector2<f64>; 3]) -> Self {
        let edge = |from: usize, to: usize| f[from] + g[from].dot(&(p[to] - p[from])) / 3.0;

        let (b210, b120) = (edge(0, 1), edge(1, 0));
        let (b201, b102) = (edge(0, 2), edge(2, 0));
        let (b021, b012) = (edge(1, 2), edge(2, 1));

        let e = (b210 + b120 + b201 + b102 + b021 + b012) / 6.0;
        let v = (f[0] + f[1] + f[2]) / 3.0;

        Self {
            b300: f[0],
            b030: f[1],
            b003: f[2],
            b210,
            b120,
            b201,
            b102,
            b021,
            b012,
            b111: e + (e - v) / 2.0,
        }
    }

    fn eval(&self, [u, v, w]: [f64; 3]) -> f64 {
        u * u * u * self.b300
            + v * v * v * self.b030
            + w * w * w * self.b003
            + 3.0 * u * u * v * self.b210
            + 3.0 * u * v * v * self.b120
            + 3.0 * u * u * w * self.b201
            + 3.0 * u * w * w * self.b102
            + 3.0 * v * v * w * self.b021
            + 3.0 * v * w * w * self.b012
            + 6.0 * u * v * w * self.b111
    }
}

/// Primary stage: piecewise cubic interpolation over the Delaunay triangles.
/// Cells outside the convex hull, or within a triangle lacking
/// one of its vertex gradients, remain undefined (NaN).
pub(crate) fn cubic(tri: &Triangulation, values: &[f64], grid: &Grid) -> DMatrix<f64> {
    let points = tri.points();
    let grads = gradients(tri, values);

    let patches = tri
        .triangles()
        .iter()
        .map(|t| {
            let g = [grads[t[0]]?, grads[t[1]]?, grads[t[2]]?];
            Some(Patch::new(
                [points[t[0]], points[t[1]], points[t[2]]],
                [values[t[0]], values[t[1]], values[t[2]]],
                g,
            ))
        })
        .collect::<Vec<_>>();

    let undefined = patches.iter().filter(|p| p.is_none()).count();
    if undefined > 0 {
        debug!("{} undefined cubic patches", undefined);
    }

    DMatrix::from_fn(grid.rows(), grid.cols(), |row, col| {
        match tri.locate(&grid.point(row, col)) {
            Some((nth, bary)) => patches[nth].as_ref().map_or(f64::NAN, |p| p.eval(bary)),
            None => f64::NAN,
        }
    })
}

/// Resolves undefined cells by linear (barycentric) interpolation.
/// Returns the number of resolved cells.
pub(crate) fn linear_fill(
    tri: &Triangulation,
    values: &[f64],
    grid: &Grid,
    z: &mut DMatrix<f64>,
) -> usize {
    let triangles = tri.triangles();
    let mut filled = 0;

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if z[(row, col)].is_finite() {
                continue;
            }
            if let Some((nth, [u, v, w])) = tri.locate(&grid.point(row, col)) {
                let t = triangles[nth];
                z[(row, col)] = u * values[t[0]] + v * values[t[1]] + w * values[t[2]];
                filled += 1;
            }
        }
    }

    trace!("linear stage resolved {} cells", filled);
    filled
}

/// Resolves undefined cells with the value of the closest sample.
/// `nearest` is the closest sample index, per cell (row major).
/// Returns the number of resolved cells.
pub(crate) fn nearest_fill(
    values: &[f64],
    nearest: &[usize],
    grid: &Grid,
    z: &mut DMatrix<f64>,
) -> usize {
    let mut filled = 0;

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if !z[(row, col)].is_finite() {
                z[(row, col)] = values[nearest[row * grid.cols() + col]];
                filled += 1;
            }
        }
    }

    trace!("nearest stage resolved {} cells", filled);
    filled
}

/// Radial basis function interpolation, linear kernel φ(r) = r,
/// with `smoothing` subtracted from the diagonal.
pub(crate) fn radial_basis(
    points: &[Vector2<f64>],
    values: &[f64],
    grid: &Grid,
    smoothing: f64,
) -> Result<DMatrix<f64>, Error> {
    let n = points.len();
    if n < 3 {
        return Err(Error::InterpolationFailure);
    }

    let kernel = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            -smoothing
        } else {
            (points[i] - points[j]).norm()
        }
    });

    let weights = kernel
        .lu()
        .solve(&DVector::from_column_slice(values))
        .ok_or(Error::MatrixInversion)?;

    if weights.iter().any(|w| !w.is_finite()) {
        return Err(Error::MatrixInversion);
    }

    let z = DMatrix::from_fn(grid.rows(), grid.cols(), |row, col| {
        let p = grid.point(row, col);
        points
            .iter()
            .zip(weights.iter())
            .map(|(q, w)| w * (p - q).norm())
            .sum::<f64>()
    });

    if z.iter().all(|v| v.is_finite()) {
        Ok(z)
    } else {
        Err(Error::InterpolationFailure)
    }
}
