//! Damped (Levenberg-Marquardt) least squares minimization
use log::trace;
use nalgebra::{DVector, Matrix2, MatrixXx2, Vector2};

/// Rectangular area the solutions should remain in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WorkingArea {
    pub min: Vector2<f64>,
    pub max: Vector2<f64>,
}

impl WorkingArea {
    /// Bounding box of these points, expanded by `margin` on every side.
    pub fn around(points: &[Vector2<f64>], margin: f64) -> Self {
        let mut min = Vector2::repeat(f64::INFINITY);
        let mut max = Vector2::repeat(f64::NEG_INFINITY);
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }
        Self {
            min: min.add_scalar(-margin),
            max: max.add_scalar(margin),
        }
    }

    pub fn contains(&self, p: &Vector2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Weighted range fitting problem:
/// `Σ w_i (|p - q_i| - d_i)²` (+ fixed penalty outside the [WorkingArea]).
pub(crate) struct Problem {
    pub points: Vec<Vector2<f64>>,
    pub distances: Vec<f64>,
    pub weights: Vec<f64>,
    pub area: WorkingArea,
    pub penalty: f64,
}

impl Problem {
    fn residuals(&self, p: &Vector2<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.points.len(),
            self.points
                .iter()
                .zip(self.distances.iter().zip(self.weights.iter()))
                .map(|(q, (d, w))| w.sqrt() * ((p - q).norm() - d)),
        )
    }

    fn jacobian(&self, p: &Vector2<f64>) -> MatrixXx2<f64> {
        let mut j = MatrixXx2::<f64>::zeros(self.points.len());
        for (i, (q, w)) in self.points.iter().zip(self.weights.iter()).enumerate() {
            let delta = p - q;
            let norm = delta.norm();
            if norm > f64::EPSILON {
                let g = delta * (w.sqrt() / norm);
                j[(i, 0)] = g.x;
                j[(i, 1)] = g.y;
            }
        }
        j
    }

    /// Objective function
    pub fn cost(&self, p: &Vector2<f64>) -> f64 {
        let cost = self.residuals(p).norm_squared();
        if self.area.contains(p) {
            cost
        } else {
            cost + self.penalty
        }
    }
}

/// Converged minimization
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Minimum {
    pub position: Vector2<f64>,
    pub cost: f64,
    pub iterations: usize,
}

const INITIAL_DAMPING: f64 = 1.0E-3;
const MIN_DAMPING: f64 = 1.0E-12;
const MAX_DAMPING: f64 = 1.0E10;

/// Minimizes [Problem] starting from `x0`.
/// Returns None if we did not converge within `max_iterations`,
/// or wound up with non finite values.
pub(crate) fn minimize(
    problem: &Problem,
    x0: Vector2<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Option<Minimum> {
    let mut x = x0;
    let mut cost = problem.cost(&x);
    if !cost.is_finite() {
        return None;
    }

    let mut lambda = INITIAL_DAMPING;

    for iter in 0..max_iterations {
        let r = problem.residuals(&x);
        let j = problem.jacobian(&x);

        let jt = j.transpose();
        let jtj: Matrix2<f64> = &jt * &j;
        let g: Vector2<f64> = &jt * &r;

        if g.norm() <= tolerance {
            return Some(Minimum {
                position: x,
                cost,
                iterations: iter,
            });
        }

        // (JᵀJ + λI) dx = -Jᵀr
        let (x_new, cost_new) = loop {
            let damped = jtj + Matrix2::identity() * lambda;
            if let Some(inv) = damped.try_inverse() {
                let x_new = x - inv * g;
                let cost_new = problem.cost(&x_new);
                if cost_new.is_finite() && cost_new < cost {
                    lambda = (lambda * 0.1).max(MIN_DAMPING);
                    break (x_new, cost_new);
                }
            }
            lambda *= 10.0;
            if lambda > MAX_DAMPING {
                // no descent direction left: local minimum
                trace!("lm: stalled at {:?} after {} iterations", x, iter);
                return Some(Minimum {
                    position: x,
                    cost,
                    iterations: iter,
                });
            }
        };

        let step = (x_new - x).norm();
        let decrease = cost - cost_new;

        x = x_new;
        cost = cost_new;

        if step <= tolerance || decrease <= tolerance * cost.max(tolerance) {
            return Some(Minimum {
                position: x,
                cost,
                iterations: iter + 1,
            });
        }
    }

    trace!("lm: iteration budget exhausted (cost={})", cost);
    None
}

#[cfg(test)]
mod test {
    use super::{minimize, Problem, WorkingArea};
    use nalgebra::Vector2;

    fn problem(truth: Vector2<f64>, points: &[(f64, f64)]) -> Problem {
        let points = points
            .iter()
            .map(|(x, y)| Vector2::new(*x, *y))
            .collect::<Vec<_>>();
        let distances = points.iter().map(|q| (truth - q).norm()).collect::<Vec<_>>();
        let weights = distances.iter().map(|d| 1.0 / (1.0 + d / 10.0)).collect();
        Problem {
            area: WorkingArea::around(&points, 1000.0),
            points,
            distances,
            weights,
            penalty: 1.0E6,
        }
    }

    #[test]
    fn exact_ranges() {
        let truth = Vector2::new(37.0, 61.0);
        let problem = problem(
            truth,
            &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0)],
        );

        let min = minimize(&problem, Vector2::new(50.0, 50.0), 1000, 1.0E-12).unwrap();
        assert!((min.position - truth).norm() < 1.0E-3, "{:?}", min);
        assert!(min.cost < 1.0E-6);
    }

    #[test]
    fn budget() {
        let truth = Vector2::new(37.0, 61.0);
        let problem = problem(truth, &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        assert!(minimize(&problem, Vector2::new(90.0, 10.0), 0, 1.0E-12).is_none());
    }

    #[test]
    fn working_area() {
        let area = WorkingArea::around(&[Vector2::new(0.0, 0.0), Vector2::new(10.0, 20.0)], 5.0);
        assert!(area.contains(&Vector2::new(-5.0, 25.0)));
        assert!(!area.contains(&Vector2::new(-5.1, 0.0)));
        assert!(!area.contains(&Vector2::new(0.0, 25.1)));
    }
}
