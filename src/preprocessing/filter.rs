//! Butterworth bandpass design and zero-phase (forward-backward) filtering.
//!
//! The design follows the analog prototype route: Butterworth lowpass poles,
//! pre-warped band edges, lowpass-to-bandpass transform and the bilinear
//! transform, expanded into transfer function coefficients `(b, a)`. The
//! forward-backward pass pads both ends with an odd extension and starts each
//! pass from the steady-state filter response, so edges do not ring.
//!
//! # Example
//!
//! ```rust
//! use ecg_hrv::preprocessing::filter::BandpassFilter;
//!
//! let filter = BandpassFilter::butterworth(2, 5.0, 15.0, 360.0).unwrap();
//! let signal: Vec<f64> = (0..720)
//!     .map(|i| (2.0 * std::f64::consts::PI * 10.0 * i as f64 / 360.0).sin())
//!     .collect();
//! let filtered = filter.filtfilt(&signal).unwrap();
//! assert_eq!(filtered.len(), signal.len());
//! ```

use core::f64::consts::PI;

use anyhow::Result;
use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use rustfft::num_complex::Complex;

use crate::config::check_band;
use crate::error::{check_sampling_rate, EcgError};

/// Transfer function coefficients of an IIR filter, normalised so that `a[0] == 1`.
///
/// Both vectors always have the same length; the shorter one is zero padded.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl FilterCoefficients {
    /// Builds coefficients from numerator `b` and denominator `a`.
    ///
    /// # Errors
    ///
    /// Returns [`EcgError::InvalidConfig`] if either vector is empty or `a[0]` is zero.
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Result<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(
                EcgError::InvalidConfig("filter coefficients must not be empty".into()).into(),
            );
        }
        let a0 = a[0];
        if a0 == 0.0 || !a0.is_finite() {
            return Err(EcgError::InvalidConfig(
                "leading denominator coefficient must be non-zero".into(),
            )
            .into());
        }
        let len = a.len().max(b.len());
        let normalise = |mut coeffs: Vec<f64>| {
            coeffs.resize(len, 0.0);
            coeffs.iter_mut().for_each(|c| *c /= a0);
            coeffs
        };
        Ok(Self {
            b: normalise(b),
            a: normalise(a),
        })
    }

    /// Designs a digital Butterworth bandpass of the given prototype order.
    ///
    /// The resulting filter has `2 * order + 1` coefficients in each of `b` and `a`
    /// and a gain of `1 / sqrt(2)` at both cutoff frequencies.
    ///
    /// # Errors
    ///
    /// - [`EcgError::InvalidConfig`] for a zero order or a bad sampling rate.
    /// - [`EcgError::InvalidBand`] unless `0 < low_hz < high_hz < sampling_rate / 2`.
    pub fn butterworth_bandpass(
        order: usize,
        low_hz: f64,
        high_hz: f64,
        sampling_rate: f64,
    ) -> Result<Self> {
        check_sampling_rate(sampling_rate)?;
        if order == 0 {
            return Err(EcgError::InvalidConfig("filter order must be at least 1".into()).into());
        }
        check_band(low_hz, high_hz, sampling_rate)?;

        // pre-warp band edges for a bilinear transform at fs = 2
        let nyquist = sampling_rate / 2.0;
        let warp = |hz: f64| 4.0 * (PI * (hz / nyquist) / 2.0).tan();
        let (warped_low, warped_high) = (warp(low_hz), warp(high_hz));
        let bandwidth = warped_high - warped_low;
        let center = (warped_low * warped_high).sqrt();

        let n = order as f64;
        let prototype: Vec<Complex<f64>> = (0..order)
            .map(|i| {
                let m = -(n - 1.0) + 2.0 * i as f64;
                -Complex::from_polar(1.0, PI * m / (2.0 * n))
            })
            .collect();

        // lowpass to bandpass: each pole splits into a pair, `order` zeros land at the origin
        let scaled: Vec<Complex<f64>> = prototype.iter().map(|p| p * bandwidth / 2.0).collect();
        let analog_poles: Vec<Complex<f64>> = {
            let shift = |p: &Complex<f64>| (p * p - center * center).sqrt();
            scaled
                .iter()
                .map(|p| p + shift(p))
                .chain(scaled.iter().map(|p| p - shift(p)))
                .collect()
        };
        let analog_gain = bandwidth.powi(order as i32);

        let fs2 = Complex::new(4.0, 0.0);
        let digital_poles: Vec<Complex<f64>> = analog_poles
            .iter()
            .map(|p| (fs2 + p) / (fs2 - p))
            .collect();
        let digital_zeros: Vec<Complex<f64>> = core::iter::repeat(Complex::new(1.0, 0.0))
            .take(order)
            .chain(core::iter::repeat(Complex::new(-1.0, 0.0)).take(order))
            .collect();
        let pole_product = analog_poles
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, p| acc * (fs2 - p));
        let digital_gain = analog_gain * (fs2.powi(order as i32) / pole_product).re;

        let b = expand_roots(&digital_zeros)
            .iter()
            .map(|c| digital_gain * c.re)
            .collect();
        let a = expand_roots(&digital_poles).iter().map(|c| c.re).collect();
        let coefficients = Self::new(b, a)?;
        trace!(
            "Butterworth bandpass order {order} [{low_hz}, {high_hz}] Hz at {sampling_rate} Hz: b = {:?}, a = {:?}",
            coefficients.b,
            coefficients.a
        );
        Ok(coefficients)
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Number of coefficients in each of `b` and `a`.
    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Runs the filter over `data` in direct form II transposed.
    ///
    /// `initial` is the delay line state (length `len() - 1`); `None` starts at rest.
    pub fn lfilter(&self, data: &[f64], initial: Option<&[f64]>) -> Vec<f64> {
        let taps = self.len();
        let mut state = match initial {
            Some(zi) => zi.to_vec(),
            None => vec![0.0; taps - 1],
        };
        state.resize(taps - 1, 0.0);
        if taps == 1 {
            return data.iter().map(|&x| self.b[0] * x).collect();
        }
        data.iter()
            .map(|&x| {
                let y = self.b[0] * x + state[0];
                for i in 0..taps - 2 {
                    state[i] = self.b[i + 1] * x + state[i + 1] - self.a[i + 1] * y;
                }
                state[taps - 2] = self.b[taps - 1] * x - self.a[taps - 1] * y;
                y
            })
            .collect()
    }

    /// Delay line state matching the steady-state response to a unit step.
    ///
    /// Scaling it by the first input sample starts the filter as if the signal
    /// had been at that level forever.
    ///
    /// # Errors
    ///
    /// Returns [`EcgError::InvalidConfig`] if the filter has a pole at `z = 1`.
    pub fn steady_state(&self) -> Result<Vec<f64>> {
        let order = self.len() - 1;
        if order == 0 {
            return Ok(Vec::new());
        }
        // (I - companion(a)^T) zi = b[1..] - a[1..] * b[0]
        let mut system = DMatrix::<f64>::identity(order, order);
        for row in 0..order {
            system[(row, 0)] += self.a[row + 1];
            if row + 1 < order {
                system[(row, row + 1)] = -1.0;
            }
        }
        let rhs = DVector::from_fn(order, |i, _| self.b[i + 1] - self.a[i + 1] * self.b[0]);
        let zi = system.lu().solve(&rhs).ok_or_else(|| {
            EcgError::InvalidConfig("filter has no steady state (pole at z = 1)".into())
        })?;
        Ok(zi.as_slice().to_vec())
    }

    /// Zero-phase filtering: forward pass, reverse pass, both started at steady state.
    ///
    /// Both ends are padded with an odd extension of `3 * len()` samples that is
    /// removed from the result, so the output has the same length as `data`.
    ///
    /// # Errors
    ///
    /// Returns [`EcgError::InsufficientData`] if `data` is not longer than the padding.
    pub fn filtfilt(&self, data: &[f64]) -> Result<Vec<f64>> {
        let padding = 3 * self.len();
        if data.len() <= padding {
            return Err(EcgError::InsufficientData {
                required: padding + 1,
                actual: data.len(),
            }
            .into());
        }
        let extended = odd_extension(data, padding);
        let zi = self.steady_state()?;
        let scaled = |level: f64| zi.iter().map(|z| z * level).collect::<Vec<f64>>();

        let forward = self.lfilter(&extended, Some(&scaled(extended[0])));
        let reversed: Vec<f64> = forward.iter().rev().copied().collect();
        let backward = self.lfilter(&reversed, Some(&scaled(reversed[0])));

        Ok(backward
            .iter()
            .rev()
            .skip(padding)
            .take(data.len())
            .copied()
            .collect())
    }
}

/// A Butterworth bandpass bound to one `(order, band, sampling rate)` configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BandpassFilter {
    coefficients: FilterCoefficients,
    low_hz: f64,
    high_hz: f64,
    sampling_rate: f64,
}

impl BandpassFilter {
    /// Designs the filter; see [`FilterCoefficients::butterworth_bandpass`].
    pub fn butterworth(order: usize, low_hz: f64, high_hz: f64, sampling_rate: f64) -> Result<Self> {
        let coefficients =
            FilterCoefficients::butterworth_bandpass(order, low_hz, high_hz, sampling_rate)?;
        Ok(Self {
            coefficients,
            low_hz,
            high_hz,
            sampling_rate,
        })
    }

    pub fn coefficients(&self) -> &FilterCoefficients {
        &self.coefficients
    }

    pub fn band(&self) -> (f64, f64) {
        (self.low_hz, self.high_hz)
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Zero-phase bandpass of `samples`; the output has the same length.
    pub fn filtfilt(&self, samples: &[f64]) -> Result<Vec<f64>> {
        debug!(
            "Bandpass [{}, {}] Hz over {} samples at {} Hz",
            self.low_hz,
            self.high_hz,
            samples.len(),
            self.sampling_rate
        );
        self.coefficients.filtfilt(samples)
    }
}

/// Designs a Butterworth bandpass and applies it forward and backward.
///
/// # Arguments
///
/// * `samples` - Raw signal.
/// * `sampling_rate` - Sampling rate in Hz.
/// * `low_hz`, `high_hz` - Band edges in Hz.
/// * `order` - Prototype order (2 for the QRS band, 4 is common for broader bands).
///
/// # Errors
///
/// [`EcgError::InvalidBand`], [`EcgError::InvalidConfig`] or
/// [`EcgError::InsufficientData`] as described on [`FilterCoefficients`].
pub fn bandpass_filter(
    samples: &[f64],
    sampling_rate: f64,
    low_hz: f64,
    high_hz: f64,
    order: usize,
) -> Result<Vec<f64>> {
    BandpassFilter::butterworth(order, low_hz, high_hz, sampling_rate)?.filtfilt(samples)
}

/// Polynomial coefficients (highest power first) of `prod(x - root)`.
fn expand_roots(roots: &[Complex<f64>]) -> Vec<Complex<f64>> {
    roots
        .iter()
        .fold(vec![Complex::new(1.0, 0.0)], |coeffs, root| {
            let mut next = vec![Complex::new(0.0, 0.0); coeffs.len() + 1];
            for (i, c) in coeffs.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c * root;
            }
            next
        })
}

/// Pads `data` with `n` samples on each side, reflected through the end points.
fn odd_extension(data: &[f64], n: usize) -> Vec<f64> {
    let first = data[0];
    let last = data[data.len() - 1];
    let left = (1..=n).rev().map(|i| 2.0 * first - data[i]);
    let right = (0..n).map(|i| 2.0 * last - data[data.len() - 2 - i]);
    left.chain(data.iter().copied()).chain(right).collect()
}
