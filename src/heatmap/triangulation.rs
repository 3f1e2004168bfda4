//! Delaunay triangulation of scattered samples
use log::trace;
use nalgebra::Vector2;

use crate::error::Error;

/// Barycentric tolerance, so cells lying on a shared edge
/// or on the hull are not lost to rounding.
const BARYCENTRIC_TOLERANCE: f64 = 1.0E-9;

/// Triangles whose doubled area falls below this
/// (relative to the squared extent) are degenerate.
const DEGENERATE_AREA: f64 = 1.0E-12;

#[derive(Debug, Clone, Copy)]
struct Circumcircle {
    center: Vector2<f64>,
    radius_sq: f64,
}

impl Circumcircle {
    fn new(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> Self {
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        if d.abs() < f64::EPSILON {
            // flat: any further insertion will invalidate it
            return Self {
                center: (a + b + c) / 3.0,
                radius_sq: f64::INFINITY,
            };
        }

        let (a2, b2, c2) = (a.norm_squared(), b.norm_squared(), c.norm_squared());
        let center = Vector2::new(
            (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
            (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
        );

        Self {
            center,
            radius_sq: (a - center).norm_squared(),
        }
    }

    fn contains(&self, p: &Vector2<f64>) -> bool {
        (p - self.center).norm_squared() < self.radius_sq
    }
}

/// Twice the signed area of (a, b, c), positive when counter clockwise
fn orientation(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Delaunay triangulation (Bowyer-Watson).
/// Triangles are stored counter clockwise, as indices
/// into the triangulated points.
#[derive(Debug, Clone)]
pub(crate) struct Triangulation {
    points: Vec<Vector2<f64>>,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Triangulates these (distinct) points.
    /// Fails when less than 3 points are given, or when they are all collinear.
    pub fn new(points: &[Vector2<f64>]) -> Result<Self, Error> {
        let n = points.len();
        if n < 3 {
            return Err(Error::Triangulation);
        }

        let (mut min, mut max) = (points[0], points[0]);
        for p in points.iter().skip(1) {
            min = min.inf(p);
            max = max.sup(p);
        }

        let extent = (max - min).max();
        if !(extent > 0.0) {
            return Err(Error::Triangulation);
        }

        let mid = (min + max) / 2.0;

        let mut vertices = points.to_vec();
        vertices.push(Vector2::new(mid.x - 20.0 * extent, mid.y - extent));
        vertices.push(Vector2::new(mid.x + 20.0 * extent, mid.y - extent));
        vertices.push(Vector2::new(mid.x, mid.y + 20.0 * extent));

        let mut triangles = vec![([n, n + 1, n + 2], {
            Circumcircle::new(&vertices[n], &vertices[n + 1], &vertices[n + 2])
        })];

        for (i, p) in points.iter().enumerate() {
            let (bad, good): (Vec<_>, Vec<_>) = triangles
                .into_iter()
                .partition(|(_, circle)| circle.contains(p));

            triangles = good;

            // cavity boundary: edges owned by a single bad triangle
            let edges = bad
                .iter()
                .flat_map(|(t, _)| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
                .collect::<Vec<_>>();

            for &(a, b) in edges.iter() {
                let shared = edges
                    .iter()
                    .filter(|&&(c, d)| (c == a && d == b) || (c == b && d == a))
                    .count();

                if shared == 1 {
                    let mut tri = [a, b, i];
                    if orientation(&vertices[a], &vertices[b], p) < 0.0 {
                        tri.swap(0, 1);
                    }
                    let circle = Circumcircle::new(
                        &vertices[tri[0]],
                        &vertices[tri[1]],
                        &vertices[tri[2]],
                    );
                    triangles.push((tri, circle));
                }
            }
        }

        let min_area = DEGENERATE_AREA * extent * extent;

        let triangles = triangles
            .into_iter()
            .map(|(t, _)| t)
            .filter(|t| t.iter().all(|&v| v < n))
            .filter(|t| orientation(&points[t[0]], &points[t[1]], &points[t[2]]) > min_area)
            .collect::<Vec<_>>();

        if triangles.is_empty() {
            return Err(Error::Triangulation);
        }

        trace!("triangulated {} points: {} triangles", n, triangles.len());

        Ok(Self {
            points: points.to_vec(),
            triangles,
        })
    }

    pub fn points(&self) -> &[Vector2<f64>] {
        &self.points
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Locates the triangle containing this point.
    /// Returns the triangle index and the barycentric coordinates,
    /// or None when the point lies outside the convex hull.
    pub fn locate(&self, p: &Vector2<f64>) -> Option<(usize, [f64; 3])> {
        self.triangles.iter().enumerate().find_map(|(nth, t)| {
            let (a, b, c) = (&self.points[t[0]], &self.points[t[1]], &self.points[t[2]]);
            let area = orientation(a, b, c);

            let u = orientation(b, c, p) / area;
            let v = orientation(c, a, p) / area;
            let w = 1.0 - u - v;

            if u >= -BARYCENTRIC_TOLERANCE
                && v >= -BARYCENTRIC_TOLERANCE
                && w >= -BARYCENTRIC_TOLERANCE
            {
                Some((nth, [u, v, w]))
            } else {
                None
            }
        })
    }

    /// Vertices connected to each vertex
    pub fn neighbours(&self) -> Vec<Vec<usize>> {
        let mut neighbours = vec![Vec::<usize>::new(); self.points.len()];
        for t in self.triangles.iter() {
            for k in 0..3 {
                let (a, b) = (t[k], t[(k + 1) % 3]);
                if !neighbours[a].contains(&b) {
                    neighbours[a].push(b);
                }
                if !neighbours[b].contains(&a) {
                    neighbours[b].push(a);
                }
            }
        }
        neighbours
    }
}

#[cfg(test)]
mod test {
    use super::Triangulation;
    use crate::error::Error;
    use nalgebra::Vector2;

    #[test]
    fn square() {
        let points = [
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(10.0, 10.0),
            Vector2::new(0.0, 10.0),
        ];

        let tri = Triangulation::new(&points).unwrap();
        assert_eq!(tri.triangles().len(), 2);

        let (_, bary) = tri.locate(&Vector2::new(5.0, 2.0)).unwrap();
        assert!((bary.iter().sum::<f64>() - 1.0).abs() < 1.0E-12);
        assert!(bary.iter().all(|b| *b >= 0.0));

        // vertices and hull
        assert!(tri.locate(&Vector2::new(0.0, 0.0)).is_some());
        assert!(tri.locate(&Vector2::new(10.0, 5.0)).is_some());
        assert!(tri.locate(&Vector2::new(10.5, 5.0)).is_none());

        let neighbours = tri.neighbours();
        assert!(neighbours.iter().all(|n| n.len() >= 2));
    }

    #[test]
    fn delaunay_property() {
        let points = (0..25)
            .map(|i| {
                let (x, y) = ((i % 5) as f64, (i / 5) as f64);
                Vector2::new(x * 10.0 + (y * 1.3).sin(), y * 10.0 + (x * 0.7).cos())
            })
            .collect::<Vec<_>>();

        let tri = Triangulation::new(&points).unwrap();
        assert!(tri.triangles().len() >= 25);

        for t in tri.triangles() {
            let circle =
                super::Circumcircle::new(&points[t[0]], &points[t[1]], &points[t[2]]);
            for (i, p) in points.iter().enumerate() {
                if !t.contains(&i) {
                    assert!(
                        (p - circle.center).norm_squared() >= circle.radius_sq - 1.0E-6,
                        "point #{} lies within circumcircle of {:?}",
                        i,
                        t
                    );
                }
            }
        }
    }

    #[test]
    fn degenerate_inputs() {
        let collinear = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(2.0, 2.0),
            Vector2::new(3.0, 3.0),
        ];
        assert_eq!(Triangulation::new(&collinear).err(), Some(Error::Triangulation));

        let identical = [Vector2::new(1.0, 1.0); 3];
        assert_eq!(Triangulation::new(&identical).err(), Some(Error::Triangulation));

        assert_eq!(
            Triangulation::new(&[Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)]).err(),
            Some(Error::Triangulation)
        );
    }
}
