//! R-peak detection in raw ECG recordings.
//!
//! The detector chains the zero-phase bandpass, the nonlinear enhancer and a
//! peak search against a single global threshold:
//!
//! 1. bandpass the recording to the QRS band,
//! 2. differentiate, square and integrate into an energy envelope,
//! 3. keep envelope maxima reaching `threshold_factor * max(envelope)` that are
//!    at least `min_beat_distance_seconds` apart.
//!
//! The threshold is computed once from the whole recording. A single large
//! artefact raises it everywhere and can hide genuine beats elsewhere.
//!
//! # Example
//!
//! ```rust
//! use ecg_hrv::config::DetectorConfig;
//! use ecg_hrv::detection::detect_r_peaks;
//!
//! let fs = 360.0;
//! let mut ecg = vec![0.0; 3600];
//! for beat in (200..3500).step_by(300) {
//!     ecg[beat] = 1.0;
//! }
//! let beats = detect_r_peaks(&ecg, fs, &DetectorConfig::default()).unwrap();
//! assert_eq!(beats.len(), 11);
//! ```

pub mod peaks;

use anyhow::Result;
use log::debug;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::config::DetectorConfig;
use crate::error::check_finite;
use crate::preprocessing::enhance::enhance;
use crate::preprocessing::filter::BandpassFilter;
use peaks::find_peaks;

/// Bandpassed content at or below this many ulps of the input amplitude is rounding noise.
const ROUNDING_FLOOR_ULPS: f64 = 64.0;

/// Detects R-peaks in an ECG recording.
///
/// # Arguments
///
/// * `samples` - Raw ECG samples, uniformly spaced.
/// * `sampling_rate` - Sampling rate in Hz.
/// * `config` - Detector options, see [`DetectorConfig`].
///
/// # Returns
///
/// Strictly increasing envelope indices of the detected beats, pairwise at
/// least `round(min_beat_distance_seconds * sampling_rate)` samples apart.
/// A recording without in-band energy yields no beats.
///
/// # Errors
///
/// - [`InvalidConfig`](crate::error::EcgError::InvalidConfig) or
///   [`InvalidBand`](crate::error::EcgError::InvalidBand) for bad options.
/// - [`InsufficientData`](crate::error::EcgError::InsufficientData) if the recording
///   is too short to filter or integrate.
/// - [`NonFiniteSample`](crate::error::EcgError::NonFiniteSample) if a sample is NaN or infinite.
pub fn detect_r_peaks(
    samples: &[f64],
    sampling_rate: f64,
    config: &DetectorConfig,
) -> Result<Vec<usize>> {
    config.validate(sampling_rate)?;
    check_finite(samples)?;
    let filter = BandpassFilter::butterworth(
        config.filter_order,
        config.band_low_hz,
        config.band_high_hz,
        sampling_rate,
    )?;
    let filtered = filter.filtfilt(samples)?;
    let envelope = enhance(&filtered, sampling_rate, config.integration_window_seconds)?;
    let distance = config.min_beat_distance(sampling_rate)?;

    if max_abs(&filtered) <= ROUNDING_FLOOR_ULPS * f64::EPSILON * max_abs(samples) {
        debug!("No in-band energy in {} samples", samples.len());
        return Ok(Vec::new());
    }
    let beats = detect_in_envelope(&envelope, config.threshold_factor, distance);
    debug!(
        "Detected {} beats in {} samples at {sampling_rate} Hz",
        beats.len(),
        samples.len()
    );
    Ok(beats)
}

/// Peak search over an energy envelope with a global threshold.
///
/// The threshold is `threshold_factor * max(envelope)`; an envelope whose
/// maximum is not positive holds no beats.
pub fn detect_in_envelope(
    envelope: &[f64],
    threshold_factor: f64,
    min_distance: usize,
) -> Vec<usize> {
    let peak = envelope.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if peak <= 0.0 || !peak.is_finite() {
        return Vec::new();
    }
    find_peaks(envelope, threshold_factor * peak, min_distance)
}

/// Runs [`detect_r_peaks`] over independent recordings in parallel.
///
/// Results are returned in input order, one per recording; a failing
/// recording does not affect the others.
pub fn detect_r_peaks_batch(
    recordings: &[Vec<f64>],
    sampling_rate: f64,
    config: &DetectorConfig,
) -> Vec<Result<Vec<usize>>> {
    recordings
        .par_iter()
        .map(|samples| detect_r_peaks(samples, sampling_rate, config))
        .collect()
}

fn max_abs(data: &[f64]) -> f64 {
    data.iter().fold(0.0, |m: f64, v| m.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EcgError;

    const FS: f64 = 360.0;

    fn impulse_train(len: usize, positions: &[usize]) -> Vec<f64> {
        let mut data = vec![0.0; len];
        positions.iter().for_each(|&p| data[p] = 1.0);
        data
    }

    #[test]
    fn test_recovers_regular_impulses() {
        let positions: Vec<usize> = (200..3500).step_by(300).collect();
        let ecg = impulse_train(3600, &positions);
        let beats = detect_r_peaks(&ecg, FS, &DetectorConfig::default()).unwrap();
        assert_eq!(beats.len(), positions.len());
        for (beat, expected) in beats.iter().zip(positions.iter()) {
            assert!(
                beat.abs_diff(*expected) <= 1,
                "beat {beat} should be within one sample of {expected}"
            );
        }
    }

    #[test]
    fn test_recovers_irregular_impulses() {
        let positions = [150, 500, 800, 1200, 1500, 1850, 2200, 2500, 2900, 3300];
        let ecg = impulse_train(3600, &positions);
        let beats = detect_r_peaks(&ecg, FS, &DetectorConfig::default()).unwrap();
        assert_eq!(beats.len(), positions.len());
        for (beat, expected) in beats.iter().zip(positions.iter()) {
            assert!(beat.abs_diff(*expected) <= 1);
        }
    }

    #[test]
    fn test_flat_recordings_have_no_beats() {
        let config = DetectorConfig::default();
        assert!(detect_r_peaks(&[0.0; 1000], FS, &config).unwrap().is_empty());
        for level in [1.5, -3.0, 1000.0] {
            let beats = detect_r_peaks(&[level; 1000], FS, &config).unwrap();
            assert!(beats.is_empty(), "constant {level} produced beats {beats:?}");
        }
    }

    #[test]
    fn test_flat_envelope_has_no_beats() {
        assert!(detect_in_envelope(&[0.0; 50], 0.6, 5).is_empty());
        assert!(detect_in_envelope(&[0.3; 50], 0.6, 5).is_empty());
        assert!(detect_in_envelope(&[], 0.6, 5).is_empty());
    }

    #[test]
    fn test_minimum_spacing() {
        // pairs of impulses 100 ms apart must collapse into single beats
        let mut positions = Vec::new();
        for start in (200..3300).step_by(400) {
            positions.push(start);
            positions.push(start + 36);
        }
        let ecg = impulse_train(3600, &positions);
        let config = DetectorConfig::default();
        let beats = detect_r_peaks(&ecg, FS, &config).unwrap();
        let distance = config.min_beat_distance(FS).unwrap();
        assert!(!beats.is_empty());
        assert!(beats.windows(2).all(|w| w[1] > w[0] && w[1] - w[0] >= distance));
    }

    #[test]
    fn test_deterministic() {
        let positions: Vec<usize> = (180..3500).step_by(290).collect();
        let mut ecg = impulse_train(3600, &positions);
        ecg.iter_mut()
            .enumerate()
            .for_each(|(i, x)| *x += 0.05 * (i as f64 * 0.9).sin());
        let config = DetectorConfig::default();
        let first = detect_r_peaks(&ecg, FS, &config).unwrap();
        let second = detect_r_peaks(&ecg, FS, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_global_threshold_hides_small_beats() {
        let positions: Vec<usize> = (200..3500).step_by(300).collect();
        let mut ecg = impulse_train(3600, &positions);
        ecg[positions[5]] = 10.0;
        let beats = detect_r_peaks(&ecg, FS, &DetectorConfig::default()).unwrap();
        assert_eq!(beats.len(), 1, "one artefact dominates the global threshold");
        assert!(beats[0].abs_diff(positions[5]) <= 1);
    }

    #[test]
    fn test_invalid_inputs() {
        let config = DetectorConfig::default();
        let err = detect_r_peaks(&[0.0; 1000], 20.0, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EcgError>(),
            Some(EcgError::InvalidBand { .. })
        ));
        let err = detect_r_peaks(&[0.0; 40], FS, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EcgError>(),
            Some(EcgError::InsufficientData { .. })
        ));
        let err = detect_r_peaks(&[0.0; 10], FS, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EcgError>(),
            Some(EcgError::InsufficientData { .. })
        ));
        let config = config.with_threshold_factor(0.0);
        let err = detect_r_peaks(&[0.0; 1000], FS, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EcgError>(),
            Some(EcgError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_non_finite_samples_rejected() {
        let config = DetectorConfig::default();
        let err = detect_r_peaks(&[f64::NAN; 1000], FS, &config).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EcgError>(),
            Some(&EcgError::NonFiniteSample { position: 0 }),
            "a recording of NaN must not pass as a flat recording"
        );
        let mut ecg = impulse_train(3600, &[200, 500, 800]);
        ecg[1234] = f64::NEG_INFINITY;
        let err = detect_r_peaks(&ecg, FS, &config).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EcgError>(),
            Some(&EcgError::NonFiniteSample { position: 1234 })
        );
    }

    #[test]
    fn test_batch_keeps_order_and_errors() {
        let regular: Vec<usize> = (200..3500).step_by(300).collect();
        let sparse: Vec<usize> = (300..3500).step_by(600).collect();
        let recordings = vec![
            impulse_train(3600, &regular),
            vec![0.0; 10],
            impulse_train(3600, &sparse),
        ];
        let results = detect_r_peaks_batch(&recordings, FS, &DetectorConfig::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().len(), regular.len());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().len(), sparse.len());
    }
}
