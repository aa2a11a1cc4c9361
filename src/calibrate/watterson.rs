use crate::error::{Result, RhonetError};

/// Harmonic number `a_n = sum_{i=1}^{n} 1/i`, the coalescent correction
/// factor for allele-count estimators.
pub fn harmonic_number(n: usize) -> f64 {
    (1..=n).map(|i| 1.0 / i as f64).sum()
}

/// Watterson's estimator of the population-scaled mutation rate from a
/// segregating-site count and a haplotype sample size. The divisor uses
/// exactly `n - 1` harmonic terms; with fewer than two haplotypes the
/// estimator is undefined.
pub fn watterson_theta(seg_sites: usize, sample_count: usize) -> Result<f64> {
    if sample_count <= 1 {
        return Err(RhonetError::Calibration(format!(
            "Watterson's estimator needs at least two sampled haplotypes, got {}",
            sample_count
        )));
    }
    Ok(seg_sites as f64 / harmonic_number(sample_count - 1))
}
