//! ECG beat detection and HRV (Heart Rate Variability) computation.
//!
//! This crate finds R-peaks in single-lead ECG recordings with a
//! Pan-Tompkins style chain (zero-phase Butterworth bandpass, derivative,
//! squaring, moving-window integration and a global threshold) and derives
//! heart rate plus time- and frequency-domain HRV metrics from the beats.
//!
//! # Example
//!
//! ```rust
//! use ecg_hrv::analysis::recording::analyze_recording;
//! use ecg_hrv::config::DetectorConfig;
//! use ecg_hrv::synthetic::SyntheticEcg;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let recording = SyntheticEcg::default()
//!     .with_heart_rate(70.0, 5.0)
//!     .generate(&mut StdRng::seed_from_u64(1))
//!     .unwrap();
//! let analysis = analyze_recording(&recording.samples, 360.0, &DetectorConfig::default()).unwrap();
//! assert!(analysis.beats.len() > 20);
//! assert!(analysis.hrv.rmssd >= 0.0);
//! ```

pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod preprocessing;
pub mod synthetic;

pub use analysis::metrics::{compute_hrv_metrics, HrvMetric, HrvMetrics};
pub use analysis::rate::{compute_heart_rate, HeartRate};
pub use config::DetectorConfig;
pub use detection::detect_r_peaks;
pub use error::EcgError;
