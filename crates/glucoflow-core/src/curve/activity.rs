//! Analytic two-parameter exponential activity model.
//!
//! The curve rises from zero at onset, peaks at `peak` minutes and decays back
//! to zero at `duration` minutes. Its integral over `[0, duration]` is one, so
//! the remaining area doubles as an "insulin on board" fraction.
//!
//! ```text
//! tau = peak * (1 - peak/duration) / (1 - 2*peak/duration)
//! a   = 2*tau/duration
//! S   = 1 / (1 - a + (1+a) * exp(-duration/tau))
//! activity(m) = S/tau^2 * m * (1 - m/duration) * exp(-m/tau)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Precomputed decay constants for one `(duration, peak)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayCurve {
    duration: f64,
    peak: f64,
    /// Time constant of the exponential decay.
    tau: f64,
    /// Rise time factor.
    a: f64,
    /// Auxiliary scale factor.
    s: f64,
}

impl DecayCurve {
    /// Derive the decay constants.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when the constants are undefined: a
    /// non-positive duration, a peak outside `(0, duration)`, a peak of
    /// exactly half the duration, or any constant that is not finite.
    pub fn new(duration: f64, peak: f64) -> Result<Self, DomainError> {
        if !(duration > 0.0) || !duration.is_finite() {
            return Err(DomainError::NonPositiveDuration(duration));
        }
        if !(peak > 0.0 && peak < duration) {
            return Err(DomainError::PeakOutOfRange { peak, duration });
        }
        let denominator = 1.0 - 2.0 * peak / duration;
        if denominator == 0.0 {
            return Err(DomainError::DegeneratePeak { peak, duration });
        }

        let tau = peak * (1.0 - peak / duration) / denominator;
        let a = 2.0 * tau / duration;
        let s = 1.0 / (1.0 - a + (1.0 + a) * (-duration / tau).exp());

        if !(tau.is_finite() && a.is_finite() && s.is_finite()) {
            return Err(DomainError::NonFinite { peak, duration });
        }

        Ok(Self {
            duration,
            peak,
            tau,
            a,
            s,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Activity `m` minutes after onset. Zero outside `[0, duration]`.
    pub fn activity(&self, m: f64) -> f64 {
        if !(0.0..=self.duration).contains(&m) {
            return 0.0;
        }
        let value = self.s / self.tau.powi(2)
            * m
            * (1.0 - m / self.duration)
            * (-m / self.tau).exp();
        // Rounding can leave a tiny negative residue right at `duration`.
        value.max(0.0)
    }

    /// Fraction of the dose still to act `m` minutes after onset.
    ///
    /// 1 before onset, 0 from `duration` on.
    pub fn on_board(&self, m: f64) -> f64 {
        if m <= 0.0 {
            return 1.0;
        }
        if m >= self.duration {
            return 0.0;
        }
        let (tau, a, s, end) = (self.tau, self.a, self.s, self.duration);
        let remaining = 1.0
            - s * (1.0 - a)
                * ((m.powi(2) / (tau * end * (1.0 - a)) - m / tau - 1.0) * (-m / tau).exp()
                    + 1.0);
        remaining.clamp(0.0, 1.0)
    }
}

/// One-shot evaluation of the activity model.
///
/// # Errors
///
/// See [`DecayCurve::new`].
pub fn activity(minutes_since_onset: f64, duration: f64, peak: f64) -> Result<f64, DomainError> {
    Ok(DecayCurve::new(duration, peak)?.activity(minutes_since_onset))
}

/// One-shot evaluation of the remaining on-board fraction.
///
/// # Errors
///
/// See [`DecayCurve::new`].
pub fn on_board(minutes_since_onset: f64, duration: f64, peak: f64) -> Result<f64, DomainError> {
    Ok(DecayCurve::new(duration, peak)?.on_board(minutes_since_onset))
}
