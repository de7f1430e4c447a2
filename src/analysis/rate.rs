//! Beat-to-beat intervals and instantaneous heart rate.

use anyhow::Result;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{check_sampling_rate, EcgError};

/// Instantaneous heart rate derived from consecutive beats.
///
/// `rr_intervals[i]` is the time in seconds between beat `i` and beat `i + 1`,
/// `bpm[i]` is `60 / rr_intervals[i]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct HeartRate {
    pub rr_intervals: Vec<f64>,
    pub bpm: Vec<f64>,
}

/// Rate summaries. A value from [`compute_heart_rate`] always holds at least
/// one rate; for a hand-built value with no rates every summary is NaN.
impl HeartRate {
    pub fn mean_bpm(&self) -> f64 {
        if self.bpm.is_empty() {
            return f64::NAN;
        }
        self.bpm.iter().sum::<f64>() / self.bpm.len() as f64
    }

    pub fn min_bpm(&self) -> f64 {
        self.bpm.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
    }

    pub fn max_bpm(&self) -> f64 {
        self.bpm.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
    }
}

/// Converts beat sample indices into intervals in seconds.
///
/// # Errors
///
/// - [`EcgError::InvalidConfig`] for a bad sampling rate.
/// - [`EcgError::InsufficientBeats`] for fewer than two beats.
/// - [`EcgError::NonMonotonicBeats`] if the indices are not strictly increasing.
pub fn rr_intervals(beats: &[usize], sampling_rate: f64) -> Result<Vec<f64>> {
    check_sampling_rate(sampling_rate)?;
    if beats.len() < 2 {
        return Err(EcgError::InsufficientBeats {
            required: 2,
            actual: beats.len(),
        }
        .into());
    }
    beats
        .windows(2)
        .enumerate()
        .map(|(position, pair)| -> Result<f64> {
            if pair[1] > pair[0] {
                Ok((pair[1] - pair[0]) as f64 / sampling_rate)
            } else {
                Err(EcgError::NonMonotonicBeats {
                    position: position + 1,
                }
                .into())
            }
        })
        .collect()
}

/// Computes beat-to-beat intervals and the instantaneous heart rate.
///
/// # Arguments
///
/// * `beats` - Strictly increasing beat sample indices.
/// * `sampling_rate` - Sampling rate of the recording in Hz.
///
/// # Errors
///
/// See [`rr_intervals`]; rate is undefined for fewer than two beats.
///
/// # Example
///
/// ```rust
/// use ecg_hrv::analysis::rate::compute_heart_rate;
///
/// let rate = compute_heart_rate(&[0, 100, 200], 100.0).unwrap();
/// assert_eq!(rate.rr_intervals, vec![1.0, 1.0]);
/// assert_eq!(rate.bpm, vec![60.0, 60.0]);
/// ```
pub fn compute_heart_rate(beats: &[usize], sampling_rate: f64) -> Result<HeartRate> {
    let rr_intervals = rr_intervals(beats, sampling_rate)?;
    let bpm: Vec<f64> = rr_intervals.iter().map(|rr| 60.0 / rr).collect();
    let rate = HeartRate { rr_intervals, bpm };
    debug!(
        "Heart rate over {} beats: mean {:.1} BPM, range {:.1}-{:.1} BPM",
        beats.len(),
        rate.mean_bpm(),
        rate.min_bpm(),
        rate.max_bpm()
    );
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_beats() {
        let rate = compute_heart_rate(&[0, 100, 200], 100.0).unwrap();
        assert_eq!(rate.rr_intervals, vec![1.0, 1.0]);
        assert_eq!(rate.bpm, vec![60.0, 60.0]);
        assert_eq!(rate.mean_bpm(), 60.0);
    }

    #[test]
    fn test_summary() {
        let rate = compute_heart_rate(&[0, 250, 450, 750], 250.0).unwrap();
        assert_eq!(rate.rr_intervals, vec![1.0, 0.8, 1.2]);
        assert!((rate.min_bpm() - 50.0).abs() < 1e-12);
        assert!((rate.max_bpm() - 75.0).abs() < 1e-12);
        assert!((rate.mean_bpm() - (60.0 + 75.0 + 50.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summaries_are_nan() {
        let rate = HeartRate {
            rr_intervals: Vec::new(),
            bpm: Vec::new(),
        };
        assert!(rate.mean_bpm().is_nan(), "mean of no rates is undefined");
        assert!(rate.min_bpm().is_nan(), "minimum of no rates is undefined");
        assert!(rate.max_bpm().is_nan(), "maximum of no rates is undefined");

        let single = compute_heart_rate(&[0, 50], 100.0).unwrap();
        assert_eq!(single.mean_bpm(), 120.0);
        assert_eq!(single.min_bpm(), 120.0);
        assert_eq!(single.max_bpm(), 120.0);
    }

    #[test]
    fn test_insufficient_beats() {
        for beats in [&[][..], &[10][..]] {
            let err = compute_heart_rate(beats, 100.0).unwrap_err();
            assert_eq!(
                err.downcast_ref::<EcgError>(),
                Some(&EcgError::InsufficientBeats {
                    required: 2,
                    actual: beats.len()
                }),
                "rate must not be computed from {} beats",
                beats.len()
            );
        }
    }

    #[test]
    fn test_non_monotonic_beats() {
        let err = compute_heart_rate(&[0, 100, 100, 300], 100.0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EcgError>(),
            Some(&EcgError::NonMonotonicBeats { position: 2 })
        );
        assert!(compute_heart_rate(&[200, 100], 100.0).is_err());
    }

    #[test]
    fn test_invalid_sampling_rate() {
        let err = compute_heart_rate(&[0, 100], 0.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EcgError>(),
            Some(EcgError::InvalidConfig(_))
        ));
    }
}
