//! End-to-end analysis of a single ECG recording.

use anyhow::{Context, Result};
use log::info;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::analysis::metrics::{compute_hrv_metrics, HrvMetrics};
use crate::analysis::rate::{compute_heart_rate, HeartRate};
use crate::config::DetectorConfig;
use crate::detection::detect_r_peaks;

/// Beats, heart rate and HRV of one recording.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingAnalysis {
    pub beats: Vec<usize>,
    pub heart_rate: HeartRate,
    pub hrv: HrvMetrics,
}

/// Detects beats and derives heart rate and HRV metrics.
///
/// Any failing stage aborts the analysis; there is no partial result.
///
/// # Errors
///
/// Configuration and data errors of [`detect_r_peaks`], and
/// [`EcgError::InsufficientBeats`](crate::error::EcgError::InsufficientBeats)
/// when fewer than three beats are found.
pub fn analyze_recording(
    samples: &[f64],
    sampling_rate: f64,
    config: &DetectorConfig,
) -> Result<RecordingAnalysis> {
    let beats = detect_r_peaks(samples, sampling_rate, config).context("beat detection failed")?;
    let heart_rate =
        compute_heart_rate(&beats, sampling_rate).context("heart rate is undefined")?;
    let hrv = compute_hrv_metrics(&beats, sampling_rate).context("HRV is undefined")?;
    info!(
        "{} beats, mean {:.1} BPM, SDNN {:.1} ms, RMSSD {:.1} ms",
        beats.len(),
        heart_rate.mean_bpm(),
        hrv.std_rr,
        hrv.rmssd
    );
    Ok(RecordingAnalysis {
        beats,
        heart_rate,
        hrv,
    })
}

/// Runs [`analyze_recording`] over independent recordings in parallel, keeping input order.
pub fn analyze_recordings(
    recordings: &[Vec<f64>],
    sampling_rate: f64,
    config: &DetectorConfig,
) -> Vec<Result<RecordingAnalysis>> {
    recordings
        .par_iter()
        .map(|samples| analyze_recording(samples, sampling_rate, config))
        .collect()
}
