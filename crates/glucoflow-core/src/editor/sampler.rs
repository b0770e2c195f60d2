//! Bounded bisection along a parametric path.

use glam::DVec2;
use serde::{Deserialize, Serialize};

fn default_tolerance() -> f64 {
    0.01
}
fn default_max_iterations() -> u32 {
    50
}

/// Finds the path point whose x coordinate matches a target.
///
/// The search always terminates after `max_iterations` steps; the closest
/// point seen so far is returned when the tolerance was not reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampler {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// Outcome of one bisection search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bisection {
    /// Path parameter of the returned point.
    pub t: f64,
    pub point: DVec2,
    pub iterations: u32,
    /// Whether `|point.x - target| <= tolerance`.
    pub converged: bool,
}

impl Sampler {
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Search `t` in `[0, 1]` so that `path(t).x` equals `target_x`.
    ///
    /// Assumes x grows with `t` over the interval.
    pub fn bisect(&self, path: impl Fn(f64) -> DVec2, target_x: f64) -> Bisection {
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        let start = path(lo);
        let mut best = Bisection {
            t: lo,
            point: start,
            iterations: 0,
            converged: (start.x - target_x).abs() <= self.tolerance,
        };
        if best.converged {
            return best;
        }

        for iteration in 1..=self.max_iterations {
            let mid = 0.5 * (lo + hi);
            let point = path(mid);
            let error = point.x - target_x;

            if error.abs() < (best.point.x - target_x).abs() {
                best.t = mid;
                best.point = point;
            }
            best.iterations = iteration;

            if error.abs() <= self.tolerance {
                best.t = mid;
                best.point = point;
                best.converged = true;
                return best;
            }
            if error < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_on_linear_path() {
        let sampler = Sampler::default();
        let result = sampler.bisect(|t| DVec2::new(100.0 * t, 1.0), 37.0);
        assert!(result.converged);
        assert!((result.point.x - 37.0).abs() <= 0.01);
    }

    #[test]
    fn converges_on_curved_path() {
        let sampler = Sampler::new(1e-6, 60);
        let result = sampler.bisect(|t| DVec2::new(t * t * 50.0, t), 12.5);
        assert!(result.converged);
        assert!((result.t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cap_returns_best_effort() {
        let sampler = Sampler::new(0.0, 3);
        let result = sampler.bisect(|t| DVec2::new(t, 0.0), 0.3);
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
        // Midpoints visited: 0.5, 0.25, 0.375.
        assert_eq!(result.t, 0.25);
    }
}
