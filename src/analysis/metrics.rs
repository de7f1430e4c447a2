//! Aggregated HRV metrics of a beat sequence.
//!
//! Time-domain metrics are always present. Frequency-domain metrics need at
//! least [`SpectralBands::min_intervals`] intervals and are left out below
//! that, so a short recording yields a partial result instead of an error.
//!
//! # Example
//!
//! ```rust
//! use ecg_hrv::analysis::metrics::{compute_hrv_metrics, HrvMetric};
//!
//! let beats: Vec<usize> = (0..8).map(|i| i * 360).collect();
//! let hrv = compute_hrv_metrics(&beats, 360.0).unwrap();
//! assert_eq!(hrv.get(HrvMetric::MeanRr), Some(1000.0));
//! assert_eq!(hrv.get(HrvMetric::Rmssd), Some(0.0));
//! assert_eq!(hrv.get(HrvMetric::LfHfRatio), None);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::analysis::frequency::{band_power, PsdEstimator, SpectralStrategy};
use crate::analysis::rate::rr_intervals;
use crate::analysis::time::{
    calc_mean_rr, calc_nn50, calc_pnn50, calc_rmssd, calc_sdrr, calc_sdsd,
};
use crate::config::SpectralBands;
use crate::error::EcgError;

/// Band powers of the RR interval spectrum, in ms².
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyDomainMetrics {
    pub lf_power: f64,
    pub hf_power: f64,
    /// `lf_power / hf_power`, or `0` when `hf_power` is not positive.
    pub lf_hf_ratio: f64,
}

/// Time-domain metrics in milliseconds plus the optional spectral metrics.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct HrvMetrics {
    pub mean_rr: f64,
    /// Population standard deviation of the intervals (SDNN).
    pub std_rr: f64,
    pub rmssd: f64,
    pub sdsd: f64,
    pub nn50: usize,
    /// Percentage in `[0, 100]`.
    pub pnn50: f64,
    pub frequency: Option<FrequencyDomainMetrics>,
}

/// Names of the reported metrics.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HrvMetric {
    MeanRr,
    StdRr,
    Rmssd,
    Sdsd,
    Nn50,
    Pnn50,
    LfPower,
    HfPower,
    LfHfRatio,
}

impl HrvMetric {
    pub const ALL: [HrvMetric; 9] = [
        HrvMetric::MeanRr,
        HrvMetric::StdRr,
        HrvMetric::Rmssd,
        HrvMetric::Sdsd,
        HrvMetric::Nn50,
        HrvMetric::Pnn50,
        HrvMetric::LfPower,
        HrvMetric::HfPower,
        HrvMetric::LfHfRatio,
    ];

    /// Canonical key of the metric.
    pub fn name(self) -> &'static str {
        match self {
            HrvMetric::MeanRr => "mean_rr",
            HrvMetric::StdRr => "std_rr",
            HrvMetric::Rmssd => "rmssd",
            HrvMetric::Sdsd => "sdsd",
            HrvMetric::Nn50 => "nn50",
            HrvMetric::Pnn50 => "pnn50",
            HrvMetric::LfPower => "lf_power",
            HrvMetric::HfPower => "hf_power",
            HrvMetric::LfHfRatio => "lf_hf_ratio",
        }
    }

    pub fn is_frequency_domain(self) -> bool {
        matches!(
            self,
            HrvMetric::LfPower | HrvMetric::HfPower | HrvMetric::LfHfRatio
        )
    }
}

impl fmt::Display for HrvMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl HrvMetrics {
    /// Computes all metrics from RR intervals in milliseconds.
    ///
    /// The spectral estimate treats the intervals as uniformly sampled at
    /// `1000 / mean_rr` Hz with segments of `min(max_segment_len, n)` samples.
    ///
    /// # Errors
    ///
    /// - [`EcgError::InsufficientBeats`] for fewer than two intervals.
    /// - Any error of the spectral estimator once the interval count permits
    ///   a spectral estimate.
    pub fn from_rr_intervals(
        rr_ms: &[f64],
        bands: &SpectralBands,
        strategy: &SpectralStrategy,
    ) -> Result<Self> {
        let mean_rr = calc_mean_rr(rr_ms)?;
        let frequency = if rr_ms.len() >= bands.min_intervals {
            let sampling_rate = 1000.0 / mean_rr;
            let segment_len = bands.max_segment_len.min(rr_ms.len());
            let spectrum = strategy.estimate(rr_ms, sampling_rate, segment_len)?;
            let lf_power = band_power(&spectrum, bands.lf.0, bands.lf.1);
            let hf_power = band_power(&spectrum, bands.hf.0, bands.hf.1);
            let lf_hf_ratio = if hf_power > 0.0 {
                lf_power / hf_power
            } else {
                0.0
            };
            Some(FrequencyDomainMetrics {
                lf_power,
                hf_power,
                lf_hf_ratio,
            })
        } else {
            debug!(
                "Skipping spectral HRV: {} intervals, {} required",
                rr_ms.len(),
                bands.min_intervals
            );
            None
        };

        Ok(Self {
            mean_rr,
            std_rr: calc_sdrr(rr_ms)?,
            rmssd: calc_rmssd(rr_ms)?,
            sdsd: calc_sdsd(rr_ms)?,
            nn50: calc_nn50(rr_ms)?,
            pnn50: calc_pnn50(rr_ms)?,
            frequency,
        })
    }

    /// Value of one metric; `None` for spectral metrics that were not computable.
    pub fn get(&self, metric: HrvMetric) -> Option<f64> {
        let frequency = self.frequency.as_ref();
        match metric {
            HrvMetric::MeanRr => Some(self.mean_rr),
            HrvMetric::StdRr => Some(self.std_rr),
            HrvMetric::Rmssd => Some(self.rmssd),
            HrvMetric::Sdsd => Some(self.sdsd),
            HrvMetric::Nn50 => Some(self.nn50 as f64),
            HrvMetric::Pnn50 => Some(self.pnn50),
            HrvMetric::LfPower => frequency.map(|f| f.lf_power),
            HrvMetric::HfPower => frequency.map(|f| f.hf_power),
            HrvMetric::LfHfRatio => frequency.map(|f| f.lf_hf_ratio),
        }
    }

    /// Name to value mapping of every computable metric.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        HrvMetric::ALL
            .iter()
            .filter_map(|&metric| self.get(metric).map(|value| (metric.name(), value)))
            .collect()
    }
}

/// Computes HRV metrics from beat sample indices.
///
/// Intervals are converted to milliseconds, then analysed with the default
/// [`SpectralBands`] and the Welch estimator.
///
/// # Errors
///
/// - [`EcgError::InsufficientBeats`] for fewer than three beats.
/// - [`EcgError::NonMonotonicBeats`] if the indices are not strictly increasing.
/// - [`EcgError::InvalidConfig`] for a bad sampling rate.
pub fn compute_hrv_metrics(beats: &[usize], sampling_rate: f64) -> Result<HrvMetrics> {
    if beats.len() < 3 {
        return Err(EcgError::InsufficientBeats {
            required: 3,
            actual: beats.len(),
        }
        .into());
    }
    let rr_ms: Vec<f64> = rr_intervals(beats, sampling_rate)?
        .into_iter()
        .map(|rr| rr * 1000.0)
        .collect();
    HrvMetrics::from_rr_intervals(&rr_ms, &SpectralBands::default(), &SpectralStrategy::Welch)
}
