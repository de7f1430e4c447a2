/// This module contains the submodules deriving heart rate and heart rate variability (HRV) from beats.
///
/// The available submodules are:
///
/// - `rate`: Beat-to-beat intervals and instantaneous heart rate.
/// - `time`: Provides time-domain analysis methods for HRV.
/// - `frequency`: Spectral estimation of the interval series and LF/HF band powers.
/// - `metrics`: Collects time- and frequency-domain HRV into one result.
/// - `recording`: Runs detection, rate and HRV over a whole recording.
pub mod frequency;
pub mod metrics;
pub mod rate;
pub mod recording;
pub mod time;
