//! Configuration of the QRS detector and of the frequency-domain HRV analysis.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{check_sampling_rate, seconds_to_samples, EcgError};
use anyhow::Result;

/// Options recognised by [`crate::detection::detect_r_peaks`].
///
/// The defaults reproduce the classic Pan-Tompkins style setup: a second order
/// 5-15 Hz bandpass, a 150 ms integration window, a global threshold at 60 % of
/// the envelope maximum and at least 600 ms between beats.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Fraction of the envelope maximum a peak must reach, in `(0, 1]`.
    pub threshold_factor: f64,
    /// Lower bandpass cutoff in Hz.
    pub band_low_hz: f64,
    /// Upper bandpass cutoff in Hz.
    pub band_high_hz: f64,
    /// Minimum spacing between two detected beats.
    pub min_beat_distance_seconds: f64,
    /// Butterworth prototype order of the bandpass.
    pub filter_order: usize,
    /// Length of the moving-window integrator.
    pub integration_window_seconds: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold_factor: 0.6,
            band_low_hz: 5.0,
            band_high_hz: 15.0,
            min_beat_distance_seconds: 0.6,
            filter_order: 2,
            integration_window_seconds: 0.15,
        }
    }
}

impl DetectorConfig {
    pub fn with_threshold_factor(mut self, threshold_factor: f64) -> Self {
        self.threshold_factor = threshold_factor;
        self
    }

    pub fn with_band(mut self, low_hz: f64, high_hz: f64) -> Self {
        self.band_low_hz = low_hz;
        self.band_high_hz = high_hz;
        self
    }

    pub fn with_min_beat_distance(mut self, seconds: f64) -> Self {
        self.min_beat_distance_seconds = seconds;
        self
    }

    pub fn with_filter_order(mut self, order: usize) -> Self {
        self.filter_order = order;
        self
    }

    pub fn with_integration_window(mut self, seconds: f64) -> Self {
        self.integration_window_seconds = seconds;
        self
    }

    /// Checks every option against the given sampling rate.
    ///
    /// # Errors
    ///
    /// - [`EcgError::InvalidConfig`] for a bad sampling rate, a threshold factor
    ///   outside `(0, 1]`, a zero filter order, or durations shorter than one sample.
    /// - [`EcgError::InvalidBand`] if the band does not satisfy `0 < low < high < fs / 2`.
    pub fn validate(&self, sampling_rate: f64) -> Result<()> {
        check_sampling_rate(sampling_rate)?;
        if !(self.threshold_factor > 0.0 && self.threshold_factor <= 1.0) {
            return Err(EcgError::InvalidConfig(format!(
                "threshold factor must be in (0, 1], got {}",
                self.threshold_factor
            ))
            .into());
        }
        if self.filter_order == 0 {
            return Err(EcgError::InvalidConfig("filter order must be at least 1".into()).into());
        }
        check_band(self.band_low_hz, self.band_high_hz, sampling_rate)?;
        self.min_beat_distance(sampling_rate)?;
        self.integration_window(sampling_rate)?;
        Ok(())
    }

    /// Minimum beat spacing in samples.
    pub fn min_beat_distance(&self, sampling_rate: f64) -> Result<usize> {
        seconds_to_samples(
            self.min_beat_distance_seconds,
            sampling_rate,
            "minimum beat distance",
        )
    }

    /// Integration window length in samples.
    pub fn integration_window(&self, sampling_rate: f64) -> Result<usize> {
        seconds_to_samples(
            self.integration_window_seconds,
            sampling_rate,
            "integration window",
        )
    }
}

/// Fails with [`EcgError::InvalidBand`] unless `0 < low_hz < high_hz < sampling_rate / 2`.
pub(crate) fn check_band(low_hz: f64, high_hz: f64, sampling_rate: f64) -> Result<()> {
    let nyquist_hz = sampling_rate / 2.0;
    if low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist_hz {
        Ok(())
    } else {
        Err(EcgError::InvalidBand {
            low_hz,
            high_hz,
            nyquist_hz,
        }
        .into())
    }
}

/// Frequency bands and preconditions of the spectral HRV estimate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBands {
    /// Low-frequency band in Hz, inclusive on both ends.
    pub lf: (f64, f64),
    /// High-frequency band in Hz, inclusive on both ends.
    pub hf: (f64, f64),
    /// Fewest intervals for which spectral metrics are reported.
    pub min_intervals: usize,
    /// Upper bound on the Welch segment length.
    pub max_segment_len: usize,
}

impl Default for SpectralBands {
    fn default() -> Self {
        Self {
            lf: (0.04, 0.15),
            hf: (0.15, 0.4),
            min_intervals: 11,
            max_segment_len: 256,
        }
    }
}
