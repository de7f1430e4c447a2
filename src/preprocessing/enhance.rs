//! Nonlinear QRS enhancement: differentiation, squaring and moving-window integration.
//!
//! The derivative emphasises the steep slopes of the QRS complex, squaring makes
//! every value positive and amplifies large slopes quadratically, and the
//! moving-window integrator smooths the result into an energy envelope whose
//! humps are roughly as wide as a QRS complex.

use anyhow::Result;
use log::debug;

use crate::error::{check_sampling_rate, seconds_to_samples, EcgError};

/// First difference `x[i + 1] - x[i]`; the output is one sample shorter.
pub fn differentiate(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

pub fn square(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x * x).collect()
}

/// Centered moving average with same-length output.
///
/// Samples outside the input are treated as zero, so the first and last half
/// window are attenuated. For even windows the average leans one sample towards
/// the past.
///
/// # Errors
///
/// - [`EcgError::InvalidConfig`] if `window` is zero.
/// - [`EcgError::InsufficientData`] if `data` is shorter than `window`.
pub fn moving_average(data: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(EcgError::InvalidConfig("moving average window must not be zero".into()).into());
    }
    if data.len() < window {
        return Err(EcgError::InsufficientData {
            required: window,
            actual: data.len(),
        }
        .into());
    }
    // prefix[i] holds the sum of data[..i]
    let prefix: Vec<f64> = core::iter::once(0.0)
        .chain(data.iter().scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        }))
        .collect();
    let offset = (window - 1) / 2;
    let scale = 1.0 / window as f64;
    Ok((0..data.len())
        .map(|i| {
            let end = (i + offset + 1).min(data.len());
            let start = (i + offset + 1).saturating_sub(window);
            (prefix[end] - prefix[start]) * scale
        })
        .collect())
}

/// Transforms a bandpassed ECG into the integrated energy envelope.
///
/// The integration window is `round(window_seconds * sampling_rate)` samples.
/// The envelope has `filtered.len() - 1` samples.
///
/// # Errors
///
/// - [`EcgError::InvalidConfig`] for a bad sampling rate or a window shorter than one sample.
/// - [`EcgError::InsufficientData`] if `filtered` has no more samples than the window.
pub fn enhance(filtered: &[f64], sampling_rate: f64, window_seconds: f64) -> Result<Vec<f64>> {
    check_sampling_rate(sampling_rate)?;
    let window = seconds_to_samples(window_seconds, sampling_rate, "integration window")?;
    if filtered.len() <= window {
        return Err(EcgError::InsufficientData {
            required: window + 1,
            actual: filtered.len(),
        }
        .into());
    }
    debug!(
        "Enhancing {} samples with a {window} sample integration window",
        filtered.len()
    );
    let squared = square(&differentiate(filtered));
    moving_average(&squared, window)
}
