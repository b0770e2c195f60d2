//! Interpolation through editor control points.
//!
//! [`MonotoneSpline`] is the cubic Hermite curve with Fritsch-Carlson style
//! tangents that chart libraries draw as "monotone in x". Its x coordinate is
//! linear in the segment parameter, so y can be evaluated at any x directly.
//!
//! [`catmull_rom_point`] gives a parametric alternative whose x is not linear
//! in the parameter; callers locate a given x with the bisection sampler.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Interpolation used to turn control points into a continuous curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    MonotoneX,
    CatmullRom,
}

/// Monotone cubic interpolation of points sorted by strictly increasing x.
#[derive(Debug, Clone)]
pub struct MonotoneSpline {
    points: Vec<DVec2>,
    tangents: Vec<f64>,
}

impl MonotoneSpline {
    pub fn new(points: &[DVec2]) -> Self {
        let points = points.to_vec();
        let tangents = monotone_tangents(&points);
        Self { points, tangents }
    }

    /// Evaluate y at `x`. `None` when `x` lies outside the control points.
    pub fn eval(&self, x: f64) -> Option<f64> {
        let n = self.points.len();
        let first = self.points.first()?;
        let last = self.points.last()?;
        if x < first.x || x > last.x {
            return None;
        }
        if n == 1 {
            return Some(first.y);
        }

        let seg = segment_index(&self.points, x);
        let (p0, p1) = (self.points[seg], self.points[seg + 1]);
        let h = p1.x - p0.x;
        if h <= 0.0 {
            return Some(p0.y);
        }
        let u = (x - p0.x) / h;
        let (u2, u3) = (u * u, u * u * u);
        let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
        let h10 = u3 - 2.0 * u2 + u;
        let h01 = -2.0 * u3 + 3.0 * u2;
        let h11 = u3 - u2;
        Some(
            h00 * p0.y
                + h10 * h * self.tangents[seg]
                + h01 * p1.y
                + h11 * h * self.tangents[seg + 1],
        )
    }
}

/// Index of the segment `[points[i], points[i + 1]]` containing `x`.
pub(crate) fn segment_index(points: &[DVec2], x: f64) -> usize {
    let upper = points.partition_point(|p| p.x <= x);
    upper.saturating_sub(1).min(points.len().saturating_sub(2))
}

fn sign(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Interior tangent limited so the curve never overshoots its neighbors.
fn interior_slope(p0: DVec2, p1: DVec2, p2: DVec2) -> f64 {
    let h0 = p1.x - p0.x;
    let h1 = p2.x - p1.x;
    if h0 <= 0.0 || h1 <= 0.0 {
        return 0.0;
    }
    let s0 = (p1.y - p0.y) / h0;
    let s1 = (p2.y - p1.y) / h1;
    let p = (s0 * h1 + s1 * h0) / (h0 + h1);
    let slope = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}

/// One-sided tangent at an end point given the neighbor's tangent.
fn edge_slope(p0: DVec2, p1: DVec2, neighbor: f64) -> f64 {
    let h = p1.x - p0.x;
    if h > 0.0 {
        (3.0 * (p1.y - p0.y) / h - neighbor) / 2.0
    } else {
        neighbor
    }
}

fn monotone_tangents(points: &[DVec2]) -> Vec<f64> {
    let n = points.len();
    match n {
        0 | 1 => vec![0.0; n],
        2 => {
            let h = points[1].x - points[0].x;
            let slope = if h > 0.0 {
                (points[1].y - points[0].y) / h
            } else {
                0.0
            };
            vec![slope, slope]
        }
        _ => {
            let mut tangents = vec![0.0; n];
            for i in 1..n - 1 {
                tangents[i] = interior_slope(points[i - 1], points[i], points[i + 1]);
            }
            tangents[0] = edge_slope(points[0], points[1], tangents[1]);
            tangents[n - 1] = edge_slope(points[n - 2], points[n - 1], tangents[n - 2]);
            tangents
        }
    }
}

/// Point on a Catmull-Rom segment (t in [0, 1]) running from `p1` to `p2`.
pub fn catmull_rom_point(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, t: f64) -> DVec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Catmull-Rom segment `seg` of `points`, with mirrored phantoms at the ends.
pub fn catmull_rom_segment(points: &[DVec2], seg: usize) -> impl Fn(f64) -> DVec2 {
    let n = points.len();
    let p1 = points[seg];
    let p2 = points[seg + 1];
    let p0 = if seg == 0 {
        2.0 * p1 - p2
    } else {
        points[seg - 1]
    };
    let p3 = if seg + 2 < n {
        points[seg + 2]
    } else {
        2.0 * p2 - p1
    };
    move |t| catmull_rom_point(p0, p1, p2, p3, t)
}
