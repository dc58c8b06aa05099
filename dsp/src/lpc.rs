use crate::autocorr::autocorrelation;
use crate::DspError;

/// Linear prediction coefficients by the Durbin-Levinson recursion.
///
/// The recursion runs over the normalized autocorrelation `r[0..=order]`
/// (zero beyond the end of a short input). It stops as soon as a
/// reflection numerator reaches the residual energy; coefficients not
/// reached by then stay 0. The result always has `order` entries.
pub fn linear_prediction(samples: &[f64], order: usize) -> Result<Vec<f64>, DspError> {
    if order < 1 {
        return Err(DspError::InvalidOrder(order));
    }
    let mut r = autocorrelation(samples)?;
    r.resize(r.len().max(order + 1), 0.0);
    Ok(durbin(&r[..=order], order))
}

/// Durbin-Levinson over a precomputed autocorrelation with at least
/// `order + 1` lags.
pub fn durbin(r: &[f64], order: usize) -> Vec<f64> {
    let mut lpc = vec![0.0; order];
    let mut prev = vec![0.0; order];
    let mut err = r[0];

    for i in 1..=order {
        let mut num = r[i];
        for j in 1..i {
            num -= lpc[j - 1] * r[i - j];
        }
        if num.abs() >= err {
            break;
        }
        let k = num / err;
        err -= num * k;

        prev[..i - 1].copy_from_slice(&lpc[..i - 1]);
        lpc[i - 1] = k;
        for j in 1..i {
            lpc[j - 1] = prev[j - 1] - k * prev[i - j - 1];
        }
    }
    lpc
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn rejects_zero_order() {
        assert_eq!(linear_prediction(&[1.0, 2.0], 0), Err(DspError::InvalidOrder(0)));
    }

    #[test]
    fn ar1_process_recovers_coefficient() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut x = vec![0.0; 8000];
        for i in 1..x.len() {
            x[i] = 0.9 * x[i - 1] + (rng.random::<f64>() - 0.5);
        }
        let lpc = linear_prediction(&x, 4).unwrap();
        assert_eq!(lpc.len(), 4);
        assert!((lpc[0] - 0.9).abs() < 0.05, "a1 = {}", lpc[0]);
        for &c in &lpc[1..] {
            assert!(c.abs() < 0.1, "higher-order term {c}");
        }
    }

    #[test]
    fn length_and_finiteness() {
        let x: Vec<f64> = (0..320)
            .map(|i| (i as f64 * 0.3).sin() + 0.5 * (i as f64 * 1.1).cos())
            .collect();
        for order in [1, 5, 10, 20] {
            let lpc = linear_prediction(&x, order).unwrap();
            assert_eq!(lpc.len(), order);
            assert!(lpc.iter().all(|c| c.is_finite()), "order {order}: {lpc:?}");
        }
    }

    #[test]
    fn short_or_silent_input_stops_early() {
        assert_eq!(linear_prediction(&[0.0; 32], 10).unwrap(), vec![0.0; 10]);
        let lpc = linear_prediction(&[1.0, 0.5], 6).unwrap();
        assert_eq!(lpc.len(), 6);
        assert!(lpc.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn durbin_breaks_on_unstable_step() {
        // r[1] == r[0] makes the first numerator equal the residual.
        assert_eq!(durbin(&[1.0, 1.0, 0.5], 2), vec![0.0, 0.0]);
    }
}
