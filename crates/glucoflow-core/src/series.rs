//! Baseline time series and the point types returned by model queries.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result, ValidationError};

/// Default spacing between baseline samples, in minutes.
pub const DEFAULT_SAMPLING_MINUTES: i64 = 5;

/// One `(time, value)` sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// One sample of a stacked-area band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackedPoint {
    pub time: DateTime<Utc>,
    /// Sum of all earlier same-kind factors.
    pub bottom: f64,
    /// `bottom` plus the factor's own contribution.
    pub top: f64,
}

/// Uniformly sampled series with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSeries {
    samples: Vec<SeriesPoint>,
    sampling_minutes: i64,
}

impl BaselineSeries {
    /// Constant series covering `[from, to)`.
    ///
    /// # Errors
    ///
    /// Fails for a non-positive sampling interval or an empty window.
    pub fn flat(
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        sampling_minutes: i64,
        value: f64,
    ) -> Result<Self> {
        if sampling_minutes <= 0 {
            return Err(DomainError::NonPositiveSampling(sampling_minutes).into());
        }
        let step = Duration::minutes(sampling_minutes);
        let mut samples = Vec::new();
        let mut time = from;
        while time < to {
            samples.push(SeriesPoint::new(time, value));
            time += step;
        }
        if samples.is_empty() {
            return Err(ValidationError::EmptyCollection("baseline window".into()).into());
        }
        Ok(Self {
            samples,
            sampling_minutes,
        })
    }

    /// Validate existing samples. The interval is taken from the first gap;
    /// a single sample gets [`DEFAULT_SAMPLING_MINUTES`].
    ///
    /// # Errors
    ///
    /// Fails when the samples are empty or not uniformly spaced.
    pub fn from_samples(samples: Vec<SeriesPoint>) -> Result<Self> {
        let first = samples
            .first()
            .ok_or_else(|| ValidationError::EmptyCollection("baseline samples".into()))?;
        let sampling_minutes = match samples.get(1) {
            Some(second) => (second.time - first.time).num_minutes(),
            None => DEFAULT_SAMPLING_MINUTES,
        };
        if sampling_minutes <= 0 {
            return Err(ValidationError::NonUniformSpacing {
                index: 1,
                expected_minutes: DEFAULT_SAMPLING_MINUTES,
                actual_minutes: sampling_minutes,
            }
            .into());
        }

        let expected = Duration::minutes(sampling_minutes);
        for (index, pair) in samples.windows(2).enumerate() {
            let gap = pair[1].time - pair[0].time;
            if gap != expected {
                return Err(ValidationError::NonUniformSpacing {
                    index: index + 1,
                    expected_minutes: sampling_minutes,
                    actual_minutes: gap.num_minutes(),
                }
                .into());
            }
        }

        Ok(Self {
            samples,
            sampling_minutes,
        })
    }

    /// Parse `("HH:MM:SS", value)` pairs against a reference date.
    ///
    /// `HH:MM` is accepted as well.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable clock string or on non-uniform spacing.
    pub fn from_clock_samples(reference: NaiveDate, samples: &[(String, f64)]) -> Result<Self> {
        let points = samples
            .iter()
            .map(|(clock, value)| -> Result<SeriesPoint> {
                let time = parse_clock(clock)?;
                Ok(SeriesPoint::new(reference.and_time(time).and_utc(), *value))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_samples(points)
    }

    pub fn samples(&self) -> &[SeriesPoint] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sampling_minutes(&self) -> i64 {
        self.sampling_minutes
    }

    pub fn sampling(&self) -> Duration {
        Duration::minutes(self.sampling_minutes)
    }

    /// First sample time.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.time)
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.time + self.sampling())
    }
}

/// Parse `HH:MM:SS` or `HH:MM`.
pub fn parse_clock(clock: &str) -> Result<NaiveTime, ValidationError> {
    let clock = clock.trim();
    NaiveTime::parse_from_str(clock, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M"))
        .map_err(|_| ValidationError::InvalidClock(clock.to_string()))
}
