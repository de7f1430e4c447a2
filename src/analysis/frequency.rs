//! Frequency-domain HRV: power spectral density of the RR interval series and band powers.
//!
//! The RR series is treated as if it were sampled uniformly at its own mean
//! rate, `1000 / mean_rr` Hz. This skips the resampling onto a uniform time
//! grid that standard HRV practice prescribes, and biases the frequency axis
//! when the heart rate varies a lot. A resampling estimator can be plugged in
//! through [`SpectralStrategy::Custom`].
//!
//! The default estimator is Welch's method with a periodic Hann window, 50 %
//! overlap, per-segment mean removal and a one-sided density scaling.
//!
//! # Example
//!
//! ```rust
//! use ecg_hrv::analysis::frequency::{band_power, welch};
//!
//! let fs = 4.0;
//! let signal: Vec<f64> = (0..256)
//!     .map(|i| (2.0 * std::f64::consts::PI * 0.25 * i as f64 / fs).sin())
//!     .collect();
//! let psd = welch(&signal, fs, 128).unwrap();
//! let hf = band_power(&psd, 0.15, 0.4);
//! let lf = band_power(&psd, 0.04, 0.15);
//! assert!(hf > lf);
//! ```

use core::f64::consts::PI;

use anyhow::Result;
use log::trace;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{check_sampling_rate, EcgError};

/// One-sided power spectral density.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PowerSpectrum {
    /// Bin frequencies in Hz, increasing.
    pub frequencies: Vec<f64>,
    /// Density per bin in units² / Hz.
    pub density: Vec<f64>,
}

/// A trait representing a power spectral density estimator for HRV interval series.
///
/// # Example
///
/// ```
/// use ecg_hrv::analysis::frequency::{PowerSpectrum, PsdEstimator};
/// use anyhow::Result;
///
/// struct FlatSpectrum;
///
/// impl PsdEstimator for FlatSpectrum {
///     fn estimate(&self, data: &[f64], sampling_rate: f64, _segment_len: usize) -> Result<PowerSpectrum> {
///         let bins = data.len() / 2 + 1;
///         Ok(PowerSpectrum {
///             frequencies: (0..bins).map(|k| k as f64 * sampling_rate / data.len() as f64).collect(),
///             density: vec![1.0; bins],
///         })
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait PsdEstimator {
    /// Estimates the spectrum of `data` sampled at `sampling_rate` Hz.
    ///
    /// `segment_len` is the requested segment length for segment-averaging estimators.
    fn estimate(&self, data: &[f64], sampling_rate: f64, segment_len: usize)
        -> Result<PowerSpectrum>;
}

/// Available spectral estimators for frequency-domain HRV.
/// User provided estimators can be passed via the `Custom` variant.
#[derive(Default)]
pub enum SpectralStrategy {
    /// Welch's averaged periodogram.
    #[default]
    Welch,
    /// A custom estimator; `Sync + Send` so analyses can run on worker threads.
    Custom(Box<dyn PsdEstimator + Sync + Send>),
}

impl PsdEstimator for SpectralStrategy {
    fn estimate(
        &self,
        data: &[f64],
        sampling_rate: f64,
        segment_len: usize,
    ) -> Result<PowerSpectrum> {
        match self {
            SpectralStrategy::Welch => welch(data, sampling_rate, segment_len),
            SpectralStrategy::Custom(estimator) => {
                estimator.estimate(data, sampling_rate, segment_len)
            }
        }
    }
}

/// Welch power spectral density estimate.
///
/// # Arguments
///
/// * `data` - Uniformly sampled series.
/// * `sampling_rate` - Sampling rate in Hz.
/// * `segment_len` - Samples per segment, clamped to `data.len()`; segments overlap by half.
///
/// # Errors
///
/// - [`EcgError::InvalidConfig`] for a bad sampling rate or a zero segment length.
/// - [`EcgError::InsufficientData`] for an empty series.
pub fn welch(data: &[f64], sampling_rate: f64, segment_len: usize) -> Result<PowerSpectrum> {
    check_sampling_rate(sampling_rate)?;
    if segment_len == 0 {
        return Err(EcgError::InvalidConfig("segment length must not be zero".into()).into());
    }
    if data.is_empty() {
        return Err(EcgError::InsufficientData {
            required: 1,
            actual: 0,
        }
        .into());
    }
    let nperseg = segment_len.min(data.len());
    let overlap = nperseg / 2;
    let step = nperseg - overlap;
    let segments = (data.len() - overlap) / step;

    let window = hann_periodic(nperseg);
    let window_power: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (sampling_rate * window_power);
    let bins = nperseg / 2 + 1;

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut density = vec![0.0; bins];
    let mut buffer = vec![Complex::new(0.0, 0.0); nperseg];
    for segment in 0..segments {
        let chunk = &data[segment * step..segment * step + nperseg];
        let mean = chunk.iter().sum::<f64>() / nperseg as f64;
        for ((slot, &x), &w) in buffer.iter_mut().zip(chunk).zip(&window) {
            *slot = Complex::new((x - mean) * w, 0.0);
        }
        fft.process(&mut buffer);
        for (k, value) in density.iter_mut().enumerate() {
            let mut power = buffer[k].norm_sqr() * scale;
            let is_nyquist = nperseg % 2 == 0 && k == nperseg / 2;
            if k != 0 && !is_nyquist {
                power *= 2.0;
            }
            *value += power;
        }
    }
    density.iter_mut().for_each(|d| *d /= segments as f64);
    trace!("Welch estimate with {segments} segments of {nperseg} samples");

    Ok(PowerSpectrum {
        frequencies: (0..bins)
            .map(|k| k as f64 * sampling_rate / nperseg as f64)
            .collect(),
        density,
    })
}

/// Integrates the density over bins with `low_hz <= f <= high_hz` using the trapezoidal rule.
///
/// Fewer than two bins inside the band integrate to zero.
pub fn band_power(spectrum: &PowerSpectrum, low_hz: f64, high_hz: f64) -> f64 {
    let (freqs, power): (Vec<f64>, Vec<f64>) = spectrum
        .frequencies
        .iter()
        .zip(&spectrum.density)
        .filter(|&(&f, _)| f >= low_hz && f <= high_hz)
        .map(|(&f, &p)| (f, p))
        .unzip();
    freqs
        .windows(2)
        .zip(power.windows(2))
        .map(|(f, p)| 0.5 * (f[1] - f[0]) * (p[0] + p[1]))
        .sum()
}

/// Hann window for spectral analysis (periodic, i.e. the first point of an `n + 1` symmetric window).
fn hann_periodic(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}
