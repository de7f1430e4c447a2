//! This module provides functions to calculate time-domain measures of heart rate variability (HRV).
//!
//! All functions take RR intervals in milliseconds and use population statistics.
//! Currently the following metrics can be calculated:
//! - Mean RR interval
//! - Standard Deviation of RR intervals (SDRR)
//! - Root Mean Square of Successive Differences (RMSSD)
//! - Standard Deviation of Successive Differences (SDSD)
//! - NN50 and pNN50

use anyhow::Result;
use log::trace;
use nalgebra::{DVector, DVectorView};

use crate::error::EcgError;

/// Successive differences larger than this many milliseconds count towards NN50.
pub const NN50_THRESHOLD_MS: f64 = 50.0;

/// Every metric needs at least two intervals, i.e. three beats.
fn check_intervals(data: &[f64]) -> Result<()> {
    if data.len() < 2 {
        Err(EcgError::InsufficientBeats {
            required: 3,
            actual: data.len() + 1,
        }
        .into())
    } else {
        Ok(())
    }
}

/// Two-pass population variance; stays non-negative for near-constant data.
fn population_variance(data: DVectorView<f64>) -> f64 {
    let centered = data.add_scalar(-data.mean());
    centered.dot(&centered) / data.len() as f64
}

fn successive_differences(data: &[f64]) -> DVector<f64> {
    let rr_points_a = DVectorView::from(&data[0..data.len() - 1]);
    let rr_points_b = DVectorView::from(&data[1..]);
    rr_points_b - rr_points_a
}

/// Calculates the mean RR interval.
///
/// # Errors
///
/// Returns [`EcgError::InsufficientBeats`] for fewer than two intervals.
pub fn calc_mean_rr(data: &[f64]) -> Result<f64> {
    check_intervals(data)?;
    Ok(DVectorView::from(data).mean())
}

/// Calculates the Root Mean Square of Successive Differences (RMSSD) from a slice of RR intervals.
///
/// RMSSD is a time-domain measure of heart rate variability, which is the square root of the mean
/// of the squares of the successive differences between adjacent RR intervals.
///
/// # Arguments
///
/// * `data` - A slice of f64 values representing RR intervals.
///
/// # Returns
///
/// * `Result<f64>` - The RMSSD value if the calculation is successful, otherwise an error.
///
/// # Errors
///
/// This function will return an error if the input slice contains fewer than two elements.
pub fn calc_rmssd(data: &[f64]) -> Result<f64> {
    check_intervals(data)?;
    let successive_diffs = successive_differences(data);
    trace!(
        "Calculating RMSSD with successive differences: {:?}",
        successive_diffs.as_slice()
    );
    Ok((successive_diffs.dot(&successive_diffs) / (successive_diffs.len() as f64)).sqrt())
}

/// Calculates the Standard Deviation of RR intervals (SDRR) from a slice of RR intervals.
///
/// SDRR is a time-domain measure of heart rate variability, which is the standard deviation
/// of the RR intervals.
///
/// # Errors
///
/// This function will return an error if the input slice contains fewer than two elements.
pub fn calc_sdrr(data: &[f64]) -> Result<f64> {
    check_intervals(data)?;
    let variance = population_variance(DVectorView::from(data));
    trace!("Calculating SDRR with variance: {}", variance);
    Ok(variance.sqrt())
}

/// Calculates the Standard Deviation of Successive Differences (SDSD).
///
/// With exactly two intervals there is a single difference and SDSD is zero.
pub fn calc_sdsd(data: &[f64]) -> Result<f64> {
    check_intervals(data)?;
    Ok(population_variance(successive_differences(data).as_view()).sqrt())
}

/// Counts successive differences whose magnitude exceeds [`NN50_THRESHOLD_MS`].
pub fn calc_nn50(data: &[f64]) -> Result<usize> {
    check_intervals(data)?;
    Ok(successive_differences(data)
        .iter()
        .filter(|d| d.abs() > NN50_THRESHOLD_MS)
        .count())
}

/// NN50 as a percentage of the number of intervals (not of the number of differences).
///
/// The result always lies in `[0, 100)`.
pub fn calc_pnn50(data: &[f64]) -> Result<f64> {
    let nn50 = calc_nn50(data)?;
    Ok(nn50 as f64 / data.len() as f64 * 100.0)
}
