use crate::fft::{self, next_pow2};
use crate::{Complex, DspError};

/// Normalized autocorrelation by the Wiener-Khinchin theorem.
///
/// The input is zero-padded to at least twice its length so the circular
/// correlation does not wrap. The result has the input's length and
/// `r[0] == 1.0`; an all-zero input gives all zeros.
pub fn autocorrelation(samples: &[f64]) -> Result<Vec<f64>, DspError> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    let size = next_pow2(2 * samples.len());
    let power: Vec<Complex> = fft::forward_real(samples, size)?
        .into_iter()
        .map(|c| Complex::real(c.norm_sqr()))
        .collect();
    let mut acf: Vec<f64> = fft::backward_transform(&power, size)?
        .into_iter()
        .take(samples.len())
        .map(|c| c.re)
        .collect();

    let r0 = acf[0];
    if r0 <= 0.0 {
        acf.iter_mut().for_each(|v| *v = 0.0);
        return Ok(acf);
    }
    acf.iter_mut().for_each(|v| *v /= r0);
    Ok(acf)
}
