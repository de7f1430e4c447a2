//! Error taxonomy shared by every stage of the detection and analysis chain.
//!
//! Library functions return [`anyhow::Result`]; the root cause is always an
//! [`EcgError`], so callers can recover the kind with
//! `err.downcast_ref::<EcgError>()`.

use thiserror::Error;

/// Precondition failures raised at stage entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EcgError {
    /// Cutoff frequencies are outside `(0, nyquist)` or not ordered.
    #[error("invalid band [{low_hz} Hz, {high_hz} Hz]: cutoffs must satisfy 0 < low < high < {nyquist_hz} Hz")]
    InvalidBand {
        low_hz: f64,
        high_hz: f64,
        nyquist_hz: f64,
    },
    /// A configuration option is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Not enough beats to form the requested number of intervals.
    #[error("at least {required} beats are required, got {actual}")]
    InsufficientBeats { required: usize, actual: usize },
    /// The sample sequence is shorter than the stage needs.
    #[error("at least {required} samples are required, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    /// A sample is NaN or infinite.
    #[error("sample {position} is not finite")]
    NonFiniteSample { position: usize },
    /// Beat indices must be strictly increasing.
    #[error("beat indices must be strictly increasing (violated at position {position})")]
    NonMonotonicBeats { position: usize },
}

/// Fails with [`EcgError::InvalidConfig`] unless `sampling_rate` is positive and finite.
pub(crate) fn check_sampling_rate(sampling_rate: f64) -> anyhow::Result<()> {
    if sampling_rate.is_finite() && sampling_rate > 0.0 {
        Ok(())
    } else {
        Err(EcgError::InvalidConfig(format!(
            "sampling rate must be positive and finite, got {sampling_rate}"
        ))
        .into())
    }
}

/// Fails with [`EcgError::NonFiniteSample`] at the first NaN or infinite sample.
pub(crate) fn check_finite(samples: &[f64]) -> anyhow::Result<()> {
    match samples.iter().position(|x| !x.is_finite()) {
        Some(position) => Err(EcgError::NonFiniteSample { position }.into()),
        None => Ok(()),
    }
}

/// Converts a duration into a whole number of samples, rejecting zero-length results.
pub(crate) fn seconds_to_samples(
    seconds: f64,
    sampling_rate: f64,
    what: &str,
) -> anyhow::Result<usize> {
    let samples = (seconds * sampling_rate).round();
    if !samples.is_finite() || samples < 1.0 {
        return Err(EcgError::InvalidConfig(format!(
            "{what} of {seconds} s is shorter than one sample at {sampling_rate} Hz"
        ))
        .into());
    }
    Ok(samples as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_rate_check() {
        assert!(check_sampling_rate(360.0).is_ok());
        for fs in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = check_sampling_rate(fs).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<EcgError>(), Some(EcgError::InvalidConfig(_))),
                "sampling rate {fs} should be rejected as invalid configuration"
            );
        }
    }

    #[test]
    fn test_seconds_to_samples() {
        assert_eq!(seconds_to_samples(0.15, 360.0, "window").unwrap(), 54);
        assert_eq!(seconds_to_samples(0.6, 250.0, "distance").unwrap(), 150);
        assert!(seconds_to_samples(0.001, 100.0, "window").is_err());
    }

    #[test]
    fn test_finite_check() {
        assert!(check_finite(&[0.0, -1.5, 2.0]).is_ok());
        assert!(check_finite(&[]).is_ok());
        let err = check_finite(&[0.0, 1.0, f64::INFINITY, f64::NAN]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EcgError>(),
            Some(&EcgError::NonFiniteSample { position: 2 })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = EcgError::InsufficientBeats {
            required: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "at least 2 beats are required, got 1");
    }
}
