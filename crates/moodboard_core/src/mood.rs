//! Mood signal and aggregation engine.
//!
//! # Responsibility
//! - Define the valence/arousal mood signal and its scalar index.
//! - Provide per-day and per-bucket rollups over caller-scoped entry sets.
//!
//! # Invariants
//! - A signal carries both components or does not exist; a single-sided
//!   signal is rejected and never aggregated or treated as zero.
//! - Aggregations are pure and read-only; visibility scoping happens
//!   before observations reach this module, never inside it.
//! - Rollup rows are ordered ascending by date or bucket key.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for signal construction and validation.
pub type SignalResult<T> = Result<T, SignalError>;

/// Errors from mood signal validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalError {
    /// Exactly one of valence/arousal was supplied.
    Inconsistent,
    /// A component falls outside `[-1.0, 1.0]`.
    OutOfRange { component: &'static str, value: f64 },
}

impl Display for SignalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inconsistent => {
                write!(f, "valence and arousal must be supplied together or not at all")
            }
            Self::OutOfRange { component, value } => {
                write!(f, "{component} {value} is outside [-1.0, 1.0]")
            }
        }
    }
}

impl Error for SignalError {}

/// A valence/arousal pair describing an emotional state.
///
/// Both components live in `[-1.0, 1.0]`. Construct through [`MoodSignal::new`]
/// or [`MoodSignal::from_parts`] so the range invariant is checked up front;
/// repositories re-run [`MoodSignal::validate`] before persisting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodSignal {
    pub valence: f64,
    pub arousal: f64,
}

impl MoodSignal {
    /// Creates a validated signal.
    pub fn new(valence: f64, arousal: f64) -> SignalResult<Self> {
        let signal = Self { valence, arousal };
        signal.validate()?;
        Ok(signal)
    }

    /// Builds an optional signal from independently optional components.
    ///
    /// # Contract
    /// - `(None, None)` -> `Ok(None)`.
    /// - `(Some, Some)` -> validated `Ok(Some(signal))`.
    /// - Anything one-sided -> `Err(SignalError::Inconsistent)`.
    pub fn from_parts(valence: Option<f64>, arousal: Option<f64>) -> SignalResult<Option<Self>> {
        match (valence, arousal) {
            (None, None) => Ok(None),
            (Some(valence), Some(arousal)) => Self::new(valence, arousal).map(Some),
            _ => Err(SignalError::Inconsistent),
        }
    }

    /// Checks both components against the `[-1.0, 1.0]` range.
    pub fn validate(&self) -> SignalResult<()> {
        for (component, value) in [("valence", self.valence), ("arousal", self.arousal)] {
            if !(-1.0..=1.0).contains(&value) || value.is_nan() {
                return Err(SignalError::OutOfRange { component, value });
            }
        }
        Ok(())
    }

    /// Scalar mood index: the Euclidean magnitude of the signal, in `[0, sqrt(2)]`.
    pub fn index(&self) -> f64 {
        (self.valence * self.valence + self.arousal * self.arousal).sqrt()
    }
}

/// One timestamped, optionally signal-bearing data point for aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodObservation {
    /// When the underlying entry was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Absent when the entry carries no mood signal.
    pub signal: Option<MoodSignal>,
}

/// Inclusive calendar-date window. Open bounds admit everything on that side.
///
/// A window whose start lies after its end matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Window covering the `days` calendar days ending at `end` inclusive.
    pub fn trailing_days(end: NaiveDate, days: u32) -> Self {
        Self {
            start: Some(end - chrono::Duration::days(i64::from(days.saturating_sub(1)))),
            end: Some(end),
        }
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Mean mood index for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyMood {
    pub date: NaiveDate,
    pub mean_index: f64,
}

/// Min/mean/max/count of the mood index for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyMoodStats {
    pub date: NaiveDate,
    pub min_index: f64,
    pub mean_index: f64,
    pub max_index: f64,
    pub entries: u64,
}

/// Mean mood index for one attribute bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoodBucket<K> {
    pub key: K,
    pub mean_index: f64,
}

/// Mean mood index per UTC calendar day, ascending by date.
///
/// Observations without a signal are excluded entirely; a day with only
/// signal-absent observations produces no row.
pub fn daily_average(observations: &[MoodObservation], range: DateRange) -> Vec<DailyMood> {
    group_by_day(observations, range)
        .into_iter()
        .map(|(date, indices)| DailyMood {
            date,
            mean_index: mean(&indices),
        })
        .collect()
}

/// Min/mean/max/count of the mood index per UTC calendar day, ascending.
pub fn daily_stats(observations: &[MoodObservation], range: DateRange) -> Vec<DailyMoodStats> {
    group_by_day(observations, range)
        .into_iter()
        .map(|(date, indices)| {
            let min = indices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = indices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            DailyMoodStats {
                date,
                min_index: min,
                mean_index: mean(&indices),
                max_index: max,
                entries: indices.len() as u64,
            }
        })
        .collect()
}

/// Mean mood index per bucket key, ascending by key.
///
/// Entries for which `signal` or `bucket` yields `None` are skipped; they
/// lack the data the rollup is keyed on.
pub fn bucket_average<T, K, S, B>(entries: &[T], signal: S, bucket: B) -> Vec<MoodBucket<K>>
where
    K: Ord,
    S: Fn(&T) -> Option<MoodSignal>,
    B: Fn(&T) -> Option<K>,
{
    let mut buckets: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for entry in entries {
        let (Some(signal), Some(key)) = (signal(entry), bucket(entry)) else {
            continue;
        };
        buckets.entry(key).or_default().push(signal.index());
    }

    buckets
        .into_iter()
        .map(|(key, indices)| MoodBucket {
            key,
            mean_index: mean(&indices),
        })
        .collect()
}

fn group_by_day(
    observations: &[MoodObservation],
    range: DateRange,
) -> BTreeMap<NaiveDate, Vec<f64>> {
    let mut days: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for observation in observations {
        let Some(signal) = observation.signal else {
            continue;
        };
        let date = observation.recorded_at.date_naive();
        if !range.contains(date) {
            continue;
        }
        days.entry(date).or_default().push(signal.index());
    }
    days
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{MoodSignal, SignalError};

    #[test]
    fn index_follows_the_3_4_5_triangle() {
        let signal = MoodSignal::new(0.6, 0.8).unwrap();
        assert!((signal.index() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn one_sided_parts_are_inconsistent_not_zero() {
        assert_eq!(
            MoodSignal::from_parts(Some(0.4), None).unwrap_err(),
            SignalError::Inconsistent
        );
        assert_eq!(
            MoodSignal::from_parts(None, Some(-0.2)).unwrap_err(),
            SignalError::Inconsistent
        );
        assert_eq!(MoodSignal::from_parts(None, None).unwrap(), None);
    }

    #[test]
    fn out_of_range_components_are_rejected() {
        let err = MoodSignal::new(1.5, 0.0).unwrap_err();
        assert!(matches!(
            err,
            SignalError::OutOfRange {
                component: "valence",
                ..
            }
        ));
    }
}
