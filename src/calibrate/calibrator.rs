use crate::calibrate::watterson::watterson_theta;
use crate::error::{Result, RhonetError};
use crate::types::{
    CalibrationMode, DemographicEpoch, MaskScan, SimulationParameterSet, WindowScan,
};

/// Mutation-rate prior bounds sit at a fixed band around the assumed point
/// estimate rather than treating it as exact.
pub const MU_LOW_FACTOR: f64 = 0.66;
pub const MU_HIGH_FACTOR: f64 = 1.33;

/// The recombination prior always starts at zero.
pub const RHO_LOW: f64 = 0.0;

/// Everything the calibrator needs beyond the collaborator outputs.
#[derive(Debug, Clone)]
pub struct CalibrationInputs {
    pub assumed_mu: f64,
    pub upper_rho_theta_ratio: f64,
    pub mask_threshold: f64,
    pub phased: bool,
    pub phase_error: f64,
    pub seed: Option<u64>,
}

/// Turn the empirical window scan into coalescent priors.
///
/// Watterson's estimator is taken over the most diverse window, then scaled
/// to an effective population size using only the accessible fraction of the
/// genome, since segregating sites were counted at accessible positions only.
/// When demographic epochs are supplied they replace the equilibrium size
/// entirely; the parameter set carries one mode or the other, never both.
pub fn calibrate(
    scan: &WindowScan,
    mask_scan: Option<&MaskScan>,
    missing_data_mask: Option<Vec<Vec<u8>>>,
    inputs: &CalibrationInputs,
    epochs: Option<Vec<DemographicEpoch>>,
) -> Result<SimulationParameterSet> {
    if scan.stats.is_empty() {
        return Err(RhonetError::Calibration(
            "the windowing collaborator returned zero windows; nothing to calibrate from"
                .to_string(),
        ));
    }
    if scan.max_window_length == 0 {
        return Err(RhonetError::Calibration(
            "maximum observed window length is zero".to_string(),
        ));
    }

    let theta_w = watterson_theta(scan.max_site_count, scan.sample_count)?;
    let mask_fraction = mask_scan.map(|m| m.mask_fraction).unwrap_or(0.0);
    if mask_fraction >= 1.0 {
        return Err(RhonetError::Calibration(format!(
            "accessibility mask covers the whole genome (masked fraction {})",
            mask_fraction
        )));
    }

    let mode = match epochs {
        Some(epochs) => CalibrationMode::Historical { epochs },
        None => {
            let ne = theta_w
                / (4.0 * inputs.assumed_mu * ((1.0 - mask_fraction) * scan.max_window_length as f64));
            CalibrationMode::Equilibrium {
                sample_count: scan.sample_count,
                ne,
            }
        }
    };

    Ok(SimulationParameterSet {
        mu_low: inputs.assumed_mu * MU_LOW_FACTOR,
        mu_high: inputs.assumed_mu * MU_HIGH_FACTOR,
        rho_low: RHO_LOW,
        rho_high: inputs.assumed_mu * inputs.upper_rho_theta_ratio,
        chromosome_length: scan.max_window_length,
        window_masks: mask_scan.map(|m| m.window_masks.clone()),
        missing_data_mask,
        mask_threshold: inputs.mask_threshold,
        phased: inputs.phased,
        phase_error: inputs.phase_error,
        seed: inputs.seed,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WindowMask, WindowStats};

    fn scan(sample_count: usize, max_sites: usize, max_len: u64) -> WindowScan {
        WindowScan {
            stats: vec![WindowStats {
                chromosome: "chr1:0-1000000".to_string(),
                window_length: max_len,
                n_windows: 50,
                min_sites: 10,
                mean_sites: 200.0,
                max_sites,
            }],
            sample_count,
            max_site_count: max_sites,
            max_window_length: max_len,
        }
    }

    fn inputs(mu: f64, ratio: f64) -> CalibrationInputs {
        CalibrationInputs {
            assumed_mu: mu,
            upper_rho_theta_ratio: ratio,
            mask_threshold: 1.0,
            phased: true,
            phase_error: 0.0,
            seed: Some(7),
        }
    }

    #[test]
    fn prior_bounds_scale_with_the_assumed_rate() {
        for mu in [1e-9, 1e-8, 2.5e-8] {
            let params = calibrate(&scan(10, 500, 100_000), None, None, &inputs(mu, 3.0), None)
                .unwrap();
            assert_eq!(params.mu_low, mu * 0.66);
            assert_eq!(params.mu_high, mu * 1.33);
            assert_eq!(params.rho_low, 0.0);
            assert_eq!(params.rho_high, mu * 3.0);
        }
    }

    #[test]
    fn equilibrium_size_matches_the_watterson_scaling() {
        let mu = 1e-8;
        let params = calibrate(&scan(5, 100, 100_000), None, None, &inputs(mu, 1.0), None).unwrap();
        // thetaW = 100 / a_4, Ne = thetaW / (4 mu L) with nothing masked
        let a4 = 1.0 + 0.5 + 1.0 / 3.0 + 0.25;
        let expected = (100.0 / a4) / (4.0 * mu * 100_000.0);
        match params.mode {
            CalibrationMode::Equilibrium { sample_count, ne } => {
                assert_eq!(sample_count, 5);
                assert!((ne - expected).abs() < 1e-6);
            }
            CalibrationMode::Historical { .. } => panic!("expected equilibrium mode"),
        }
    }

    #[test]
    fn masked_fraction_shrinks_the_denominator() {
        let mask = MaskScan {
            mask_fraction: 0.5,
            window_masks: vec![WindowMask {
                inaccessible_fraction: 0.5,
                spans: vec![(0, 500)],
            }],
        };
        let unmasked =
            calibrate(&scan(10, 500, 100_000), None, None, &inputs(1e-8, 1.0), None).unwrap();
        let masked =
            calibrate(&scan(10, 500, 100_000), Some(&mask), None, &inputs(1e-8, 1.0), None)
                .unwrap();
        let ne = |p: &SimulationParameterSet| match &p.mode {
            CalibrationMode::Equilibrium { ne, .. } => *ne,
            CalibrationMode::Historical { .. } => panic!("expected equilibrium mode"),
        };
        assert!((ne(&masked) - 2.0 * ne(&unmasked)).abs() < 1e-6);
        assert!(masked.window_masks.is_some());
    }

    #[test]
    fn history_and_equilibrium_are_mutually_exclusive() {
        let epochs = vec![
            DemographicEpoch { time: 0.0, size: 10_000.0 },
            DemographicEpoch { time: 250.0, size: 40_000.0 },
        ];
        let with_history = calibrate(
            &scan(10, 500, 100_000),
            None,
            None,
            &inputs(1e-8, 1.0),
            Some(epochs.clone()),
        )
        .unwrap();
        match with_history.mode {
            CalibrationMode::Historical { epochs: got } => assert_eq!(got, epochs),
            CalibrationMode::Equilibrium { .. } => panic!("expected historical mode"),
        }

        let without = calibrate(&scan(10, 500, 100_000), None, None, &inputs(1e-8, 1.0), None)
            .unwrap();
        assert!(matches!(without.mode, CalibrationMode::Equilibrium { .. }));
    }

    #[test]
    fn degenerate_inputs_fail_loudly() {
        let empty = WindowScan {
            stats: vec![],
            sample_count: 10,
            max_site_count: 0,
            max_window_length: 0,
        };
        assert!(calibrate(&empty, None, None, &inputs(1e-8, 1.0), None).is_err());
        assert!(calibrate(&scan(1, 500, 100_000), None, None, &inputs(1e-8, 1.0), None).is_err());

        let all_masked = MaskScan { mask_fraction: 1.0, window_masks: vec![] };
        assert!(calibrate(
            &scan(10, 500, 100_000),
            Some(&all_masked),
            None,
            &inputs(1e-8, 1.0),
            None
        )
        .is_err());
    }
}
