//! Digital filters.
//!
//! Butterworth IIR filters are built from [`FILTER_SECTIONS`] cascaded
//! sections with coefficients fixed at construction. [`GaussianFilter`] is a
//! plain FIR smoother.

mod butterworth;
mod gaussian;

pub use butterworth::{BandPassFilter, FILTER_SECTIONS, HighPassFilter, LowPassFilter};
pub use gaussian::GaussianFilter;

/// A filter over a block of samples.
///
/// Every call starts from a cleared state; nothing carries over between
/// blocks.
pub trait DigitalFilter {
    fn filter(&mut self, samples: &[f64]) -> Vec<f64>;
}
