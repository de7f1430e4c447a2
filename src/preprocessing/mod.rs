//! Signal conditioning ahead of beat detection.
//!
//! The `filter` submodule designs Butterworth bandpass filters and applies them without phase shift.
//! The `enhance` submodule turns a filtered recording into an energy envelope that peaks at each QRS complex.
pub mod enhance;
pub mod filter;
