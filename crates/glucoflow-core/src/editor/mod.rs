//! Interactive curve editor.
//!
//! The editor keeps an ordered list of control points in a `width × height`
//! drawing box. The x axis maps linearly onto `[0, duration]` minutes; y grows
//! downward, so the top of the box is the highest activity.
//!
//! ## Rules
//!
//! - The first and last points are pinned to `x = 0` and `x = width`.
//! - Neighbors stay at least `min_spacing_minutes` apart in curve time.
//! - Refused edits return an [`InvariantViolation`] and change nothing.
//!
//! ## Usage
//!
//! ```ignore
//! let mut editor = CurveEditor::new(300, 80, EditorLayout::default())?;
//! editor.insert(400.0, 150.0)?;
//! let table = CurveFactory::new().build_from_editor(editor.export_curve());
//! ```

mod interpolation;
mod sampler;

use glam::DVec2;
use serde::{Deserialize, Serialize};

pub use interpolation::{catmull_rom_point, catmull_rom_segment, Interpolation, MonotoneSpline};
pub use sampler::{Bisection, Sampler};

use crate::error::{DomainError, InvariantViolation};

fn default_width() -> f64 {
    600.0
}
fn default_height() -> f64 {
    300.0
}
fn default_top_margin() -> f64 {
    10.0
}
fn default_min_spacing_minutes() -> f64 {
    5.0
}

/// Drawing box geometry and spacing rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditorLayout {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Distance of the default peak point from the top edge.
    #[serde(default = "default_top_margin")]
    pub top_margin: f64,
    #[serde(default = "default_min_spacing_minutes")]
    pub min_spacing_minutes: f64,
}

impl EditorLayout {
    /// Check that the layout describes a usable drawing box.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidLayout`] naming the first bad field.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |field: &str, value: f64| DomainError::InvalidLayout {
            field: field.to_string(),
            value,
        };
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("min_spacing_minutes", self.min_spacing_minutes),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, value));
            }
        }
        if !(self.top_margin >= 0.0 && self.top_margin <= self.height) {
            return Err(invalid("top_margin", self.top_margin));
        }
        Ok(())
    }
}

impl Default for EditorLayout {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            top_margin: default_top_margin(),
            min_spacing_minutes: default_min_spacing_minutes(),
        }
    }
}

/// Control-point editing session bound to one `(duration, peak)` pair.
#[derive(Debug, Clone)]
pub struct CurveEditor {
    duration: u32,
    peak: u32,
    layout: EditorLayout,
    points: Vec<DVec2>,
    selected: Option<usize>,
    interpolation: Interpolation,
    sampler: Sampler,
}

impl CurveEditor {
    /// Start a session with the default tent: both edges at the bottom of the
    /// box and one point near the top at the peak minute.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when `duration` is zero, `peak` does not
    /// lie strictly inside `(0, duration)` or the layout is unusable.
    pub fn new(duration: u32, peak: u32, layout: EditorLayout) -> Result<Self, DomainError> {
        layout.validate()?;
        if duration == 0 {
            return Err(DomainError::NonPositiveDuration(0.0));
        }
        if peak == 0 || peak >= duration {
            return Err(DomainError::PeakOutOfRange {
                peak: peak as f64,
                duration: duration as f64,
            });
        }
        let mut editor = Self {
            duration,
            peak,
            layout,
            points: Vec::new(),
            selected: None,
            interpolation: Interpolation::default(),
            sampler: Sampler::default(),
        };
        editor.reset();
        Ok(editor)
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn peak(&self) -> u32 {
        self.peak
    }

    pub fn layout(&self) -> &EditorLayout {
        &self.layout
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Minimum horizontal distance between neighbors, in box units.
    pub fn min_spacing(&self) -> f64 {
        self.layout.width / self.duration as f64 * self.layout.min_spacing_minutes
    }

    pub fn minute_to_x(&self, minute: f64) -> f64 {
        minute * self.layout.width / self.duration as f64
    }

    pub fn x_to_minute(&self, x: f64) -> f64 {
        x * self.duration as f64 / self.layout.width
    }

    fn is_edge(&self, index: usize) -> bool {
        index == 0 || index + 1 == self.points.len()
    }

    fn check_index(&self, index: usize) -> Result<(), InvariantViolation> {
        if index >= self.points.len() {
            return Err(InvariantViolation::IndexOutOfBounds {
                index,
                len: self.points.len(),
            });
        }
        Ok(())
    }

    fn check_finite(x: f64, y: f64) -> Result<(), InvariantViolation> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(InvariantViolation::NonFinite { x, y });
        }
        Ok(())
    }

    /// Whether `x` keeps at least the minimum spacing to both neighbors.
    fn fits_between(&self, x: f64, left: f64, right: f64) -> bool {
        let min_spacing = self.min_spacing();
        x - left >= min_spacing && right - x >= min_spacing
    }

    fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(0.0, self.layout.height)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Restore the default three-point tent.
    pub fn reset(&mut self) {
        let (w, h) = (self.layout.width, self.layout.height);
        self.points = vec![
            DVec2::new(0.0, h),
            DVec2::new(self.minute_to_x(self.peak as f64), self.layout.top_margin.min(h)),
            DVec2::new(w, h),
        ];
        self.selected = Some(1);
    }

    pub fn select(&mut self, index: usize) -> Result<(), InvariantViolation> {
        self.check_index(index)?;
        self.selected = Some(index);
        Ok(())
    }

    /// Insert a point before the first point lying to its right.
    ///
    /// Returns the index of the new point, which becomes selected.
    ///
    /// # Errors
    ///
    /// Refuses points outside the box or closer than [`Self::min_spacing`]
    /// to either neighbor.
    pub fn insert(&mut self, x: f64, y: f64) -> Result<usize, InvariantViolation> {
        Self::check_finite(x, y)?;
        let width = self.layout.width;
        if !(x > 0.0 && x < width) {
            return Err(InvariantViolation::OutsideBox { x, width });
        }
        let index = self
            .points
            .iter()
            .position(|p| p.x > x)
            .unwrap_or(self.points.len());
        let left = self.points[index - 1].x;
        let right = self.points[index].x;
        if !self.fits_between(x, left, right) {
            return Err(InvariantViolation::TooClose {
                x,
                min_spacing: self.min_spacing(),
            });
        }

        self.points.insert(index, DVec2::new(x, self.clamp_y(y)));
        self.selected = Some(index);
        tracing::debug!(index, x, y, "inserted control point");
        Ok(index)
    }

    /// Move a point. Edge points only move vertically; `y` is clamped to
    /// the box.
    ///
    /// # Errors
    ///
    /// Refuses an interior `x` that would come closer than
    /// [`Self::min_spacing`] to a neighbor.
    pub fn drag(&mut self, index: usize, x: f64, y: f64) -> Result<DVec2, InvariantViolation> {
        self.check_index(index)?;
        Self::check_finite(x, y)?;
        let y = self.clamp_y(y);
        if self.is_edge(index) {
            self.points[index].y = y;
            self.selected = Some(index);
            return Ok(self.points[index]);
        }

        let left = self.points[index - 1].x;
        let right = self.points[index + 1].x;
        if !self.fits_between(x, left, right) {
            return Err(InvariantViolation::TooClose {
                x,
                min_spacing: self.min_spacing(),
            });
        }

        self.points[index] = DVec2::new(x, y);
        self.selected = Some(index);
        Ok(self.points[index])
    }

    /// Move a point, clamping `x` into the range its neighbors allow.
    pub fn drag_clamped(
        &mut self,
        index: usize,
        x: f64,
        y: f64,
    ) -> Result<DVec2, InvariantViolation> {
        self.check_index(index)?;
        Self::check_finite(x, y)?;
        if self.is_edge(index) {
            return self.drag(index, x, y);
        }
        let min_spacing = self.min_spacing();
        let lo = self.points[index - 1].x + min_spacing;
        let hi = self.points[index + 1].x - min_spacing;
        let x = if lo <= hi { x.clamp(lo, hi) } else { 0.5 * (lo + hi) };
        self.points[index] = DVec2::new(x, self.clamp_y(y));
        self.selected = Some(index);
        Ok(self.points[index])
    }

    /// Remove an interior point and select its predecessor.
    ///
    /// # Errors
    ///
    /// Refuses the pinned first and last points.
    pub fn delete(&mut self, index: usize) -> Result<DVec2, InvariantViolation> {
        self.check_index(index)?;
        if self.is_edge(index) {
            return Err(InvariantViolation::PinnedEndpoint(index));
        }
        let removed = self.points.remove(index);
        self.selected = Some(index - 1);
        tracing::debug!(index, "deleted control point");
        Ok(removed)
    }

    /// Delete the selected point, if it is an interior one.
    pub fn delete_selected(&mut self) -> Result<DVec2, InvariantViolation> {
        match self.selected {
            Some(index) => self.delete(index),
            None => Err(InvariantViolation::IndexOutOfBounds {
                index: 0,
                len: 0,
            }),
        }
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Rasterize the curve into `duration` per-minute activity values.
    ///
    /// Both end entries are 0. Every interior minute reads the interpolated
    /// curve at that minute's x and normalizes it to `[0, 1]` with the top of
    /// the box as 1.
    pub fn export_curve(&self) -> Vec<f64> {
        let len = self.duration as usize;
        let mut values = vec![0.0; len];
        if len < 3 {
            return values;
        }

        let height = self.layout.height;
        let locate = self.locator();
        let mut unconverged = 0usize;
        for (minute, value) in values.iter_mut().enumerate().take(len - 1).skip(1) {
            let x = self.minute_to_x(minute as f64);
            let (y, converged) = locate(x);
            if !converged {
                unconverged += 1;
            }
            *value = ((height - y) / height).clamp(0.0, 1.0);
        }

        if unconverged > 0 {
            tracing::warn!(
                unconverged,
                max_iterations = self.sampler.max_iterations,
                "curve sampler hit its iteration cap; using closest points"
            );
        }
        tracing::debug!(
            duration = self.duration,
            points = self.points.len(),
            "exported editor curve"
        );
        values
    }

    /// Returns a closure mapping x to `(y, converged)` on the current curve.
    fn locator(&self) -> Box<dyn Fn(f64) -> (f64, bool) + '_> {
        let bottom = self.layout.height;
        match self.interpolation {
            Interpolation::MonotoneX => {
                let spline = MonotoneSpline::new(&self.points);
                Box::new(move |x| (spline.eval(x).unwrap_or(bottom), true))
            }
            Interpolation::CatmullRom => Box::new(move |x| {
                let seg = interpolation::segment_index(&self.points, x);
                let path = catmull_rom_segment(&self.points, seg);
                let found = self.sampler.bisect(path, x);
                (found.point.y, found.converged)
            }),
        }
    }
}
