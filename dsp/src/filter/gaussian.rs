use super::DigitalFilter;
use crate::DspError;

/// Gaussian smoothing kernel of odd width.
///
/// `sigma = (diameter - 1) / 6`, so the kernel spans three standard
/// deviations either side. Samples beyond the ends count as zero.
#[derive(Debug, Clone)]
pub struct GaussianFilter {
    kernel: Vec<f64>,
}

impl GaussianFilter {
    pub fn new(diameter: usize) -> Result<Self, DspError> {
        if diameter == 0 || diameter % 2 == 0 {
            return Err(DspError::range(
                "blur diameter",
                format!("must be odd and positive, got {diameter}"),
            ));
        }
        if diameter == 1 {
            return Ok(Self { kernel: vec![1.0] });
        }

        let half = (diameter / 2) as f64;
        let sigma = (diameter - 1) as f64 / 6.0;
        let mut kernel: Vec<f64> = (0..diameter)
            .map(|i| {
                let d = i as f64 - half;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let sum: f64 = kernel.iter().sum();
        kernel.iter_mut().for_each(|k| *k /= sum);
        Ok(Self { kernel })
    }

    pub fn kernel(&self) -> &[f64] {
        &self.kernel
    }
}

impl DigitalFilter for GaussianFilter {
    fn filter(&mut self, samples: &[f64]) -> Vec<f64> {
        let half = self.kernel.len() / 2;
        let n = samples.len();
        (0..n)
            .map(|i| {
                self.kernel
                    .iter()
                    .enumerate()
                    .filter_map(|(k, w)| {
                        let j = (i + k).checked_sub(half)?;
                        samples.get(j).map(|x| w * x)
                    })
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_symmetric_unit_sum() {
        let f = GaussianFilter::new(9).unwrap();
        let k = f.kernel();
        assert_eq!(k.len(), 9);
        assert!((k.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for i in 0..4 {
            assert!((k[i] - k[8 - i]).abs() < 1e-15);
            assert!(k[i] < k[i + 1]);
        }
    }

    #[test]
    fn preserves_constant_interior() {
        let mut f = GaussianFilter::new(5).unwrap();
        let out = f.filter(&[2.0; 20]);
        for v in &out[2..18] {
            assert!((v - 2.0).abs() < 1e-12);
        }
        // Zero padding pulls the edges down.
        assert!(out[0] < 2.0);
        assert!(out[19] < 2.0);
    }

    #[test]
    fn spreads_an_impulse() {
        let mut f = GaussianFilter::new(3).unwrap();
        let out = f.filter(&[0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(out[0], 0.0);
        assert!(out[1] > 0.0 && out[1] < out[2]);
        assert!((out[1] - out[3]).abs() < 1e-15);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn diameter_one_is_identity() {
        let mut f = GaussianFilter::new(1).unwrap();
        assert_eq!(f.filter(&[1.0, -3.0]), vec![1.0, -3.0]);
    }

    #[test]
    fn rejects_even_or_zero_diameter() {
        assert!(GaussianFilter::new(0).is_err());
        assert!(GaussianFilter::new(4).is_err());
    }
}
