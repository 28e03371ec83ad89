//! Gaussian price generation.

use rand_distr::{Distribution, Normal, NormalError};

/// Draws prices from a normal distribution configured at startup.
///
/// Sampling has no side effects on shared state; it happens entirely
/// outside the critical section.
pub struct PriceSource {
    dist: Normal<f64>,
}

impl PriceSource {
    /// Build a source for `Normal(mean, std_dev)`.
    ///
    /// Fails for a negative or non-finite standard deviation.
    /// `Normal::new` itself tolerates a negative std-dev (the distribution
    /// is mirror-symmetric), so the range check is explicit here.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self, NormalError> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(NormalError::BadVariance);
        }
        Ok(Self {
            dist: Normal::new(mean, std_dev)?,
        })
    }

    /// Draw one sample.
    pub fn next_price(&self) -> f64 {
        self.dist.sample(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_std_dev() {
        assert!(PriceSource::new(100.0, -1.0).is_err());
    }

    #[test]
    fn rejects_non_finite_std_dev() {
        assert!(PriceSource::new(100.0, f64::NAN).is_err());
        assert!(PriceSource::new(100.0, f64::INFINITY).is_err());
    }

    #[test]
    fn zero_std_dev_returns_mean() {
        let source = PriceSource::new(42.5, 0.0).unwrap();
        for _ in 0..10 {
            assert_eq!(source.next_price(), 42.5);
        }
    }

    #[test]
    fn samples_are_finite() {
        let source = PriceSource::new(1800.0, 15.0).unwrap();
        for _ in 0..100 {
            assert!(source.next_price().is_finite());
        }
    }
}
