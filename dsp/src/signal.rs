use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::basic::{self, NoisySignal};
use crate::filter::{BandPassFilter, DigitalFilter, GaussianFilter, HighPassFilter, LowPassFilter};
use crate::frame::{self, AnalysisFrame};
use crate::{autocorr, fft, lpc, Complex, DspError, WindowFunction};

/// Format attached to every signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleFormat {
    pub sample_rate: u32,
}

impl SampleFormat {
    /// Creates a format for `sample_rate` Hz.
    pub const fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

/// A sampled signal: a sample buffer plus its format.
///
/// `S` is `f64` for time-domain data and real-valued tracks, or [`Complex`]
/// for spectra (see [`Spectrum`]). Signals are values: every transform
/// returns a new signal and leaves the receiver untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal<S = f64> {
    samples: Vec<S>,
    format: SampleFormat,
}

/// A complex-valued frequency-domain signal.
pub type Spectrum = Signal<Complex>;

impl<S> Signal<S> {
    /// Creates a signal of `samples` recorded at `sample_rate` Hz.
    pub fn new(samples: Vec<S>, sample_rate: u32) -> Self {
        Self::with_format(samples, SampleFormat::new(sample_rate))
    }

    /// Creates a signal with an explicit format.
    pub fn with_format(samples: Vec<S>, format: SampleFormat) -> Self {
        Self { samples, format }
    }

    /// Returns the samples.
    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    /// Consumes the signal and returns its samples.
    pub fn into_samples(self) -> Vec<S> {
        self.samples
    }

    /// Returns the sample format.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Reports whether the signal has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.format.sample_rate as f64
    }

    /// Fails unless `other` has the same sample rate.
    pub fn check_compatible<T>(&self, other: &Signal<T>) -> Result<(), DspError> {
        if self.format.sample_rate != other.format.sample_rate {
            return Err(DspError::SampleRateMismatch {
                expected: self.format.sample_rate,
                got: other.format.sample_rate,
            });
        }
        Ok(())
    }

    fn derive<T>(&self, samples: Vec<T>) -> Signal<T> {
        Signal::with_format(samples, self.format)
    }
}

impl Signal<f64> {
    /// Mean power `sum(x^2) / len`.
    pub fn energy(&self) -> f64 {
        basic::energy(&self.samples)
    }

    /// Normalized correlation with a copy of itself shifted by `delay` samples.
    pub fn correlation(&self, delay: usize) -> f64 {
        basic::correlation(&self.samples, delay)
    }

    /// Complex spectrum of size `size` (forward transform, scaled by `1/size`).
    pub fn spectrum(&self, size: usize) -> Result<Spectrum, DspError> {
        Ok(self.derive(fft::forward_real(&self.samples, size)?))
    }

    /// Treats the samples as a real spectrum and transforms them back.
    pub fn backward_transform(&self, size: usize) -> Result<Signal, DspError> {
        Ok(self.derive(fft::backward_real(&self.samples, size)?))
    }

    /// Autocorrelation normalized so that lag zero equals 1.
    pub fn autocorrelation(&self) -> Result<Signal, DspError> {
        Ok(self.derive(autocorr::autocorrelation(&self.samples)?))
    }

    /// Linear prediction coefficients of the given order.
    pub fn linear_prediction(&self, order: usize) -> Result<Vec<f64>, DspError> {
        lpc::linear_prediction(&self.samples, order)
    }

    /// Copies `len` samples starting at `start`. Positions past the end are
    /// zero-filled.
    pub fn extract_interval(&self, start: usize, len: usize) -> Signal {
        let mut out = vec![0.0; len];
        if start < self.samples.len() {
            let n = len.min(self.samples.len() - start);
            out[..n].copy_from_slice(&self.samples[start..start + n]);
        }
        self.derive(out)
    }

    /// Center clipping: keeps samples whose magnitude exceeds
    /// `level * max|x|`, zeroes the others.
    pub fn central_limitation(&self, level: f64) -> Result<Signal, DspError> {
        Ok(self.derive(basic::central_limitation(&self.samples, level)?))
    }

    /// Scales the signal so that its peak magnitude is 1.
    pub fn normalize(&self) -> Signal {
        self.derive(basic::normalize(&self.samples))
    }

    /// Multiplies the samples by `window`.
    pub fn apply_window(&self, window: WindowFunction) -> Signal {
        self.derive(window.apply(&self.samples))
    }

    /// Splits the signal into overlapping windowed analysis frames.
    pub fn split(
        &self,
        interval: f64,
        overlap: f64,
        window: WindowFunction,
    ) -> Result<Vec<AnalysisFrame>, DspError> {
        frame::split(self, interval, overlap, window)
    }

    /// Butterworth low-pass at `cutoff` Hz.
    pub fn low_pass(&self, cutoff: f64) -> Result<Signal, DspError> {
        let mut f = LowPassFilter::new(cutoff, self.sample_rate())?;
        Ok(self.derive(f.filter(&self.samples)))
    }

    /// Butterworth high-pass at `cutoff` Hz.
    pub fn high_pass(&self, cutoff: f64) -> Result<Signal, DspError> {
        let mut f = HighPassFilter::new(cutoff, self.sample_rate())?;
        Ok(self.derive(f.filter(&self.samples)))
    }

    /// Butterworth band-pass between `low` and `high` Hz.
    pub fn band_pass(&self, low: f64, high: f64) -> Result<Signal, DspError> {
        let mut f = BandPassFilter::new(low, high, self.sample_rate())?;
        Ok(self.derive(f.filter(&self.samples)))
    }

    /// Gaussian blur over `diameter` samples.
    pub fn gaussian_blur(&self, diameter: usize) -> Result<Signal, DspError> {
        let mut f = GaussianFilter::new(diameter)?;
        Ok(self.derive(f.filter(&self.samples)))
    }

    /// Mixes in uniform noise of amplitude `level`. The SNR is measured
    /// against the signal energy inside `energy_range`.
    pub fn add_noise<R: Rng + ?Sized>(
        &self,
        level: f64,
        energy_range: std::ops::Range<usize>,
        rng: &mut R,
    ) -> Result<NoisySignal, DspError> {
        let (samples, snr_db) = basic::add_noise(&self.samples, level, energy_range, rng)?;
        Ok(NoisySignal {
            signal: self.derive(samples),
            snr_db,
        })
    }

    /// Sample-wise sum of two signals of equal rate. The shorter one is
    /// treated as zero-padded.
    pub fn mix(&self, other: &Signal) -> Result<Signal, DspError> {
        self.check_compatible(other)?;
        let n = self.len().max(other.len());
        let samples = (0..n)
            .map(|i| {
                self.samples.get(i).copied().unwrap_or(0.0)
                    + other.samples.get(i).copied().unwrap_or(0.0)
            })
            .collect();
        Ok(self.derive(samples))
    }

    /// Lifts the samples into a complex signal with zero imaginary parts.
    pub fn to_complex(&self) -> Spectrum {
        self.derive(self.samples.iter().map(|&x| Complex::real(x)).collect())
    }
}

impl Signal<Complex> {
    /// Inverse transform into the time domain (real part kept).
    pub fn backward_transform(&self, size: usize) -> Result<Signal, DspError> {
        let out = fft::backward_transform(&self.samples, size)?;
        Ok(self.derive(out.into_iter().map(|c| c.re).collect()))
    }

    /// Magnitude of every bin.
    pub fn magnitudes(&self) -> Signal {
        self.derive(self.samples.iter().map(Complex::norm).collect())
    }

    /// Real part of every bin.
    pub fn real_part(&self) -> Signal {
        self.derive(self.samples.iter().map(|c| c.re).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    fn tone(freq: f64, sample_rate: u32, n: usize, amp: f64) -> Signal {
        let samples = (0..n)
            .map(|i| amp * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin())
            .collect();
        Signal::new(samples, sample_rate)
    }

    /// Indices of local extrema in the lower half of a magnitude spectrum,
    /// ignoring bins below a small floor.
    fn extrema(mags: &[f64]) -> Vec<usize> {
        let mut out = Vec::new();
        for i in 1..mags.len() / 2 - 1 {
            if mags[i] < 0.002 {
                continue;
            }
            let max = mags[i] > mags[i - 1] && mags[i] > mags[i + 1];
            let min = mags[i] < mags[i - 1] && mags[i] < mags[i + 1];
            if max || min {
                out.push(i);
            }
        }
        out
    }

    fn bin_hz(bin: usize, sample_rate: u32, size: usize) -> f64 {
        sample_rate as f64 * bin as f64 / size as f64
    }

    #[test]
    fn spectrum_of_1500hz_tone() {
        let signal = tone(1500.0, 16000, 1024, 0.8).normalize();
        let spectrum = signal.spectrum(1024).unwrap();
        assert_eq!(spectrum.len(), 1024);

        let mags = spectrum.magnitudes().normalize();
        let ext = extrema(mags.samples());
        assert_eq!(ext.len(), 1, "expected a single extremum, got {ext:?}");
        let hz = bin_hz(ext[0], 16000, 1024);
        assert!((hz - 1500.0).abs() < 10.0, "peak at {hz} Hz");
    }

    #[test]
    fn band_pass_keeps_in_band_tone() {
        let signal = tone(1500.0, 16000, 4096, 0.8).normalize();
        let filtered = signal.band_pass(100.0, 3000.0).unwrap();
        assert_ne!(filtered, signal);

        // Skip the filter's settling time before analysis.
        let tail = filtered.extract_interval(2048, 1024);
        let reference = signal.extract_interval(2048, 1024);
        let ratio = tail.energy() / reference.energy();
        assert!((ratio - 1.0).abs() < 0.05, "pass-band gain {ratio}");

        let mags = tail.spectrum(1024).unwrap().magnitudes();
        let peak = (0..512)
            .max_by(|&a, &b| mags.samples()[a].total_cmp(&mags.samples()[b]))
            .unwrap();
        let hz = bin_hz(peak, 16000, 1024);
        assert!((hz - 1500.0).abs() < 10.0, "peak at {hz} Hz");
    }

    #[test]
    fn band_pass_rejects_out_of_band_tone() {
        let signal = tone(6000.0, 16000, 4096, 0.8);
        let filtered = signal.band_pass(100.0, 3000.0).unwrap();
        let tail = filtered.extract_interval(2048, 1024);
        assert!(
            tail.energy() < signal.energy() * 1e-3,
            "6 kHz tone leaked: {} vs {}",
            tail.energy(),
            signal.energy()
        );
    }

    #[test]
    fn low_and_high_pass_split_two_tones() {
        let low = tone(200.0, 16000, 8192, 0.5);
        let high = tone(4000.0, 16000, 8192, 0.5);
        let both = low.mix(&high).unwrap();

        let lp = both.low_pass(1000.0).unwrap().extract_interval(4096, 4096);
        let hp = both.high_pass(1000.0).unwrap().extract_interval(4096, 4096);
        let low_tail = low.extract_interval(4096, 4096);
        let high_tail = high.extract_interval(4096, 4096);

        // Each filter passes its own tone with roughly its input power.
        assert!((lp.energy() / low_tail.energy() - 1.0).abs() < 0.05);
        assert!((hp.energy() / high_tail.energy() - 1.0).abs() < 0.05);
    }

    #[test]
    fn extract_interval_zero_fills_past_end() {
        let s = Signal::new(vec![1.0, 2.0, 3.0], 8000);
        assert!(s.extract_interval(0, 0).is_empty());
        assert_eq!(s.extract_interval(1, 2).samples(), &[2.0, 3.0]);
        assert_eq!(s.extract_interval(0, 4).samples(), &[1.0, 2.0, 3.0, 0.0]);
        assert_eq!(s.extract_interval(5, 2).samples(), &[0.0, 0.0]);
    }

    #[test]
    fn spectrum_roundtrip_through_signal() {
        let s = tone(440.0, 8000, 256, 0.3);
        let back = s.spectrum(256).unwrap().backward_transform(256).unwrap();
        for (a, b) in s.samples().iter().zip(back.samples()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn mix_requires_same_rate() {
        let a = Signal::new(vec![1.0], 8000);
        let b = Signal::new(vec![1.0], 16000);
        assert_eq!(
            a.mix(&b),
            Err(DspError::SampleRateMismatch {
                expected: 8000,
                got: 16000
            })
        );
        let c = Signal::new(vec![0.5, 0.5], 8000);
        assert_eq!(a.mix(&c).unwrap().samples(), &[1.5, 0.5]);
    }

    #[test]
    fn transforms_leave_input_untouched() {
        let s = tone(300.0, 8000, 512, 0.9);
        let copy = s.clone();
        let _ = s.normalize();
        let _ = s.low_pass(1000.0).unwrap();
        let _ = s.apply_window(WindowFunction::Hamming);
        let _ = s.central_limitation(0.5).unwrap();
        assert_eq!(s, copy);
    }
}
