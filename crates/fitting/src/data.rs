//! Data arrays, preprocessing, and the x-domain rescaling

// crate modules
use crate::error::{Error, Result};
use crate::options::FitOptions;

// external crates
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Aligned (x, y, error) arrays for a single spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Time of flight, or whatever the fit domain happens to be
    pub x: Vec<f64>,
    /// Measured values
    pub y: Vec<f64>,
    /// Errors on the measured values
    pub e: Vec<f64>,
}

impl Dataset {
    /// Create a dataset, checking the arrays line up
    ///
    /// ```rust
    /// # use ncstools_fitting::Dataset;
    /// assert!(Dataset::new(vec![1.0, 2.0], vec![3.0, 4.0], vec![0.1, 0.1]).is_ok());
    /// assert!(Dataset::new(vec![1.0, 2.0], vec![3.0], vec![0.1, 0.1]).is_err());
    /// assert!(Dataset::new(vec![], vec![], vec![]).is_err());
    /// ```
    pub fn new(x: Vec<f64>, y: Vec<f64>, e: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || x.len() != e.len() {
            return Err(Error::DatasetShape {
                x: x.len(),
                y: y.len(),
                e: e.len(),
            });
        }

        if x.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Ok(Self { x, y, e })
    }

    /// Number of data points
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True if there are no data points
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Exclude every point with an error above the threshold
    ///
    /// ```rust
    /// # use ncstools_fitting::Dataset;
    /// let data = Dataset::new(vec![1.0, 2.0, 3.0], vec![5.0, 6.0, 7.0], vec![0.1, 9.0, 0.2]).unwrap();
    /// let masked = data.mask(1.0).unwrap();
    /// assert_eq!(masked.x, vec![1.0, 3.0]);
    /// ```
    pub fn mask(&self, threshold: f64) -> Result<Self> {
        if !(threshold >= 0.0 && threshold.is_finite()) {
            return Err(Error::InvalidThreshold(threshold));
        }

        info!("Masking data with errors > {threshold:.6}");

        let mut masked = Self {
            x: Vec::with_capacity(self.len()),
            y: Vec::with_capacity(self.len()),
            e: Vec::with_capacity(self.len()),
        };

        for i in 0..self.len() {
            if self.e[i] > threshold {
                debug!("Masking point {i} at x={}", self.x[i]);
                continue;
            }
            masked.x.push(self.x[i]);
            masked.y.push(self.y[i]);
            masked.e.push(self.e[i]);
        }

        if masked.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Ok(masked)
    }

    /// Moving average over `points` neighbours
    ///
    /// An even number of points is increased by one so the window is centred.
    /// Near the ends the window is truncated to whatever points exist. Errors
    /// are combined in quadrature and divided by the number of points.
    ///
    /// ```rust
    /// # use ncstools_fitting::Dataset;
    /// let data = Dataset::new(vec![0.0, 1.0, 2.0], vec![1.0, 4.0, 1.0], vec![1.0; 3]).unwrap();
    /// let smooth = data.smooth(3).unwrap();
    /// assert_eq!(smooth.y, vec![2.5, 2.0, 2.5]);
    /// ```
    pub fn smooth(&self, points: i32) -> Result<Self> {
        if points <= 0 {
            return Err(Error::InvalidSmoothing(points));
        }

        let window = (if points % 2 == 0 { points + 1 } else { points }) as usize;
        let half = window / 2;
        info!("Smoothing data using {window} neighbours");

        let n = self.len();
        let mut y = Vec::with_capacity(n);
        let mut e = Vec::with_capacity(n);

        for i in 0..n {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            let count = (hi - lo) as f64;
            y.push(self.y[lo..hi].iter().sum::<f64>() / count);
            e.push(self.e[lo..hi].iter().map(|e| e * e).sum::<f64>().sqrt() / count);
        }

        Ok(Self {
            x: self.x.clone(),
            y,
            e,
        })
    }

    /// Apply the smoothing and masking steps set in the options
    ///
    /// Smoothing is always applied before masking.
    pub fn preprocess(&self, options: &FitOptions) -> Result<Self> {
        info!("Preprocessing");
        let mut data = self.clone();

        if let Some(points) = options.smooth_points {
            data = data.smooth(points)?;
        }

        if let Some(threshold) = options.bad_data_error {
            data = data.mask(threshold)?;
        }

        Ok(data)
    }
}

/// Source of raw spectra
///
/// Loading and instrument corrections are entirely up to the implementation.
pub trait DataLoader {
    /// Load a single spectrum by selector and index
    fn load(&self, source: &str, index: usize) -> Result<Dataset>;

    /// Load, then preprocess with the fit options
    fn load_and_preprocess(
        &self,
        source: &str,
        index: usize,
        options: &FitOptions,
    ) -> Result<Dataset> {
        self.load(source, index)?.preprocess(options)
    }
}

/// Multiplicative rescaling of the x domain for optimizer calls
///
/// Only a rescaled copy of the data is ever handed to the optimizer. The
/// original arrays are never modified, so anything reported against them is
/// in physical units exactly.
///
/// ```rust
/// # use ncstools_fitting::{Dataset, DomainScale};
/// let scale = DomainScale::new(1e-6).unwrap();
/// let data = Dataset::new(vec![100.0, 200.0], vec![1.0, 2.0], vec![0.1, 0.1]).unwrap();
///
/// let scaled = scale.apply(&data);
/// assert_eq!(scaled.x, vec![100.0 * 1e-6, 200.0 * 1e-6]);
/// assert_eq!(scaled.y, data.y);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainScale(f64);

impl DomainScale {
    /// Create a scale, which must be finite and positive
    pub fn new(factor: f64) -> Result<Self> {
        if factor > 0.0 && factor.is_finite() {
            Ok(Self(factor))
        } else {
            Err(Error::InvalidScale(factor))
        }
    }

    /// Scale factor
    pub fn factor(&self) -> f64 {
        self.0
    }

    /// Rescaled copy of the data
    pub fn apply(&self, data: &Dataset) -> Dataset {
        Dataset {
            x: data.x.iter().map(|x| x * self.0).collect(),
            y: data.y.clone(),
            e: data.e.clone(),
        }
    }
}

/// Calculated curve in physical units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitCurve {
    /// Original x values of the fitted data
    pub x: Vec<f64>,
    /// Calculated values
    pub y: Vec<f64>,
}

impl FitCurve {
    /// Pair a calculated curve with the unscaled x values it was fitted on
    pub fn new(data: &Dataset, calculated: Vec<f64>) -> Result<Self> {
        if calculated.len() != data.len() {
            return Err(Error::CurveLength {
                expected: data.len(),
                found: calculated.len(),
            });
        }

        Ok(Self {
            x: data.x.clone(),
            y: calculated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Dataset {
        Dataset::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.1, 0.2, 0.3, 0.4, 0.5],
        )
        .unwrap()
    }

    #[test]
    fn even_window_is_bumped() {
        let data = ramp();
        assert_eq!(data.smooth(2).unwrap(), data.smooth(3).unwrap());
    }

    #[test]
    fn single_point_window_is_identity() {
        let data = ramp();
        assert_eq!(data.smooth(1).unwrap().y, data.y);
    }

    #[test]
    fn non_positive_smoothing() {
        assert!(matches!(ramp().smooth(0), Err(Error::InvalidSmoothing(0))));
        assert!(matches!(ramp().smooth(-3), Err(Error::InvalidSmoothing(-3))));
    }

    #[test]
    fn masking_everything_is_an_error() {
        assert!(matches!(ramp().mask(0.01), Err(Error::EmptyDataset)));
        assert!(matches!(ramp().mask(-1.0), Err(Error::InvalidThreshold(_))));
    }

    #[test]
    fn scale_keeps_original_untouched() {
        let data = ramp();
        let scaled = DomainScale::new(1e-6).unwrap().apply(&data);
        assert_ne!(scaled.x, data.x);
        assert_eq!(ramp(), data);
        assert!(DomainScale::new(0.0).is_err());
    }

    /// Serves the same noisy spectrum for every request
    struct Noisy;

    impl DataLoader for Noisy {
        fn load(&self, _: &str, _: usize) -> Result<Dataset> {
            Dataset::new(vec![0.0, 1.0, 2.0], vec![1.0; 3], vec![0.1, 3.0, 0.1])
        }
    }

    #[test]
    fn smoothing_happens_before_masking() {
        let options = FitOptions {
            smooth_points: Some(3),
            bad_data_error: Some(2.0),
            ..Default::default()
        };

        // Masking first would drop the middle point
        let raw = Noisy.load("15039", 0).unwrap();
        assert_eq!(raw.mask(2.0).unwrap().len(), 2);

        let data = raw.preprocess(&options).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data, raw.smooth(3).unwrap().mask(2.0).unwrap());
        assert!((data.e[1] - 9.02_f64.sqrt() / 3.0).abs() < 1e-12);

        assert_eq!(Noisy.load_and_preprocess("15039", 0, &options).unwrap(), data);
    }

    #[test]
    fn preprocess_without_options_is_a_copy() {
        let data = ramp();
        assert_eq!(data.preprocess(&FitOptions::default()).unwrap(), data);
    }

    #[test]
    fn curve_length_must_match() {
        let data = ramp();
        assert!(FitCurve::new(&data, vec![1.0; 5]).is_ok());
        assert!(matches!(
            FitCurve::new(&data, vec![1.0; 4]),
            Err(Error::CurveLength { expected: 5, found: 4 })
        ));
    }
}
