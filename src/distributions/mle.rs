//! Fitting orchestration shared by every family: estimation, Fisher
//! information, information criteria and parameter bounds.

use std::f64::consts::PI;

use tracing::{debug, warn};

use super::Distribution;
use crate::bounds::{fisher_bounds, fisher_bounds_linear, likelihood_ratio_bounds};
use crate::config::{AnalysisConfig, BoundMethod, FitMethod};
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::matrix::{covariance_from_information, outer_product_information, Matrix2};
use crate::model::{Estimate, FittedModel, ModelKind, Parameter};
use crate::regression::rank_regression;
use crate::solver::{maximize_golden, Solver};

/// Fits `dist` to `data` and attaches parameter bounds.
///
/// The dataset is expanded to unit-weight rows first (grouped rank
/// regression keeps the grouped rows). Maximum likelihood
/// reports the log-likelihood with `AIC = −2·logL + 2k` and
/// `BIC = −2·logL + (ln n − ln π)`; rank regression reports the correlation
/// coefficient instead. Bounds follow `config.bound_method`; Crow and
/// Beta/PERT bounds do not apply to life distributions, so Fisher bounds are
/// used and the substitution is recorded in `warnings`.
///
/// # Errors
/// - [`ReliabilityError::DegenerateParameter`] when every row is censored.
/// - [`ReliabilityError::InsufficientData`] with fewer failures than
///   parameters.
/// - Solver errors from the estimation step.
pub fn fit_model(
    dist: &dyn Distribution,
    data: &Dataset,
    config: &AnalysisConfig,
) -> Result<FittedModel> {
    let config = config.clone().validate()?;
    let grouped = data;
    let data = data.expanded();
    let k = dist.parameter_names().len();
    let n_failures = data.n_failures();

    if n_failures == 0 {
        return Err(ReliabilityError::degenerate(format!(
            "{} fit needs at least one failure; all {} observations are censored",
            dist.kind(),
            data.len()
        )));
    }
    if n_failures < k {
        return Err(ReliabilityError::insufficient(k, n_failures));
    }

    let solver = config.solver();
    let mut model = match config.fit_method {
        FitMethod::Mle => {
            let params = dist.mle(&data, &solver)?;
            let ll = dist.log_likelihood(&params, &data);
            if !ll.is_finite() {
                return Err(ReliabilityError::degenerate(format!(
                    "log-likelihood is not finite at {params:?}"
                )));
            }
            let info = information_matrix(dist, &params, &data);
            let covariance = covariance_from_information(&info, k)?;
            let n = data.len() as f64;
            FittedModel {
                kind: ModelKind::Distribution(dist.kind()),
                method: FitMethod::Mle,
                parameters: dist
                    .parameter_names()
                    .iter()
                    .zip(&params)
                    .map(|(&name, &p)| Parameter {
                        name,
                        estimate: Estimate::point(p),
                    })
                    .collect(),
                covariance,
                log_likelihood: Some(ll),
                aic: Some(-2.0 * ll + 2.0 * k as f64),
                bic: Some(-2.0 * ll + (n.ln() - PI.ln())),
                correlation: None,
                n_failures,
                n_suspensions: data.n_suspensions(),
                warnings: Vec::new(),
            }
        }
        FitMethod::RankRegression => rank_regression(grouped, dist.kind(), &config)?,
    };

    apply_bounds(dist, &data, &mut model, &config, &solver)?;
    debug!(
        kind = %dist.kind(),
        method = ?model.method,
        params = ?model.point_estimates(),
        "fitted life distribution"
    );
    Ok(model)
}

fn apply_bounds(
    dist: &dyn Distribution,
    data: &Dataset,
    model: &mut FittedModel,
    config: &AnalysisConfig,
    solver: &dyn Solver,
) -> Result<()> {
    let method = match config.bound_method {
        BoundMethod::Fisher | BoundMethod::LikelihoodRatio => config.bound_method,
        other => {
            warn!(
                requested = ?other,
                "bound method does not apply to life distributions; using Fisher"
            );
            model.warnings.push(ReliabilityError::invalid(format!(
                "{other:?} bounds do not apply to life distributions; Fisher bounds used"
            )));
            BoundMethod::Fisher
        }
    };

    let params = model.point_estimates();
    let reference = dist.log_likelihood(&params, data);

    for (i, &point) in params.iter().enumerate() {
        let estimate = match method {
            BoundMethod::LikelihoodRatio => {
                let profile = |v: f64| profile_log_likelihood(dist, data, &params, i, v);
                let limit = if dist.is_location(i) {
                    f64::NEG_INFINITY
                } else {
                    0.0
                };
                likelihood_ratio_bounds(
                    &profile,
                    point,
                    reference,
                    config.confidence,
                    config.interval,
                    limit,
                    solver,
                )?
            }
            _ if dist.is_location(i) => fisher_bounds_linear(
                point,
                model.variance(i),
                config.confidence,
                config.interval,
            )?,
            _ => fisher_bounds(point, model.variance(i), config.confidence, config.interval)?,
        };
        model.parameters[i].estimate = estimate;
    }
    Ok(())
}

/// Fisher information from per-observation log-likelihood contributions.
pub fn information_matrix(dist: &dyn Distribution, params: &[f64], data: &Dataset) -> Matrix2 {
    let rows = data.observations();
    outer_product_information(
        params,
        rows.len(),
        |i| rows[i].weight(),
        |i, p| dist.log_contribution(&rows[i], p),
    )
}

/// Log-likelihood with parameter `index` fixed at `value`, maximized over
/// the other parameter (if any).
pub fn profile_log_likelihood(
    dist: &dyn Distribution,
    data: &Dataset,
    params: &[f64],
    index: usize,
    value: f64,
) -> f64 {
    let mut fixed = params.to_vec();
    fixed[index] = value;
    if fixed.len() == 1 {
        return dist.log_likelihood(&fixed, data);
    }

    let other = 1 - index;
    let center = params[other];
    let ll = |v: f64| {
        let mut q = fixed.clone();
        q[other] = v;
        let l = dist.log_likelihood(&q, data);
        if l.is_nan() {
            f64::NEG_INFINITY
        } else {
            l
        }
    };

    let best = if dist.is_location(other) {
        // Location parameters move on the scale of the spread parameter.
        let span = 10.0 * fixed[1 - other].abs().max(1e-6);
        maximize_golden(&ll, center - span, center + span, 200, 1e-10)
    } else {
        let log_ll = |u: f64| ll(u.exp());
        maximize_golden(&log_ll, center.ln() - 4.0, center.ln() + 4.0, 200, 1e-10).map(f64::exp)
    };
    best.map_or_else(|_| ll(center), |v| ll(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{DistributionKind, Exponential, Weibull};

    #[test]
    fn all_censored_is_degenerate() {
        let records = vec![
            crate::dataset::RawRecord::new("a", 0.0, 10.0, "suspension", 1),
            crate::dataset::RawRecord::new("b", 0.0, 20.0, "suspension", 1),
        ];
        let data = crate::dataset::format_dataset(&records, &AnalysisConfig::default()).unwrap();
        for kind in DistributionKind::ALL {
            let r = kind.model().fit(&data, &AnalysisConfig::default());
            assert!(matches!(r, Err(ReliabilityError::DegenerateParameter(_))), "{kind}");
        }
    }

    #[test]
    fn two_parameter_needs_two_failures() {
        let data = Dataset::from_failures(&[10.0]).unwrap();
        let r = Weibull.fit(&data, &AnalysisConfig::default());
        assert_eq!(r.unwrap_err(), ReliabilityError::insufficient(2, 1));
        assert!(Exponential.fit(&data, &AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn information_criteria() {
        let data = Dataset::from_failures(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        let m = Exponential.fit(&data, &AnalysisConfig::default()).unwrap();
        let ll = m.log_likelihood.unwrap();
        assert!((m.aic.unwrap() - (-2.0 * ll + 2.0)).abs() < 1e-12);
        assert!((m.bic.unwrap() - (-2.0 * ll + 4.0_f64.ln() - PI.ln())).abs() < 1e-12);
    }

    #[test]
    fn crow_bounds_fall_back_to_fisher() {
        let data = Dataset::from_failures(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        let config = AnalysisConfig {
            bound_method: BoundMethod::Crow,
            ..AnalysisConfig::default()
        };
        let m = Exponential.fit(&data, &config).unwrap();
        assert_eq!(m.warnings.len(), 1);
        let fisher = Exponential.fit(&data, &AnalysisConfig::default()).unwrap();
        assert_eq!(m.parameters, fisher.parameters);
    }

    #[test]
    fn profile_equals_likelihood_at_estimate() {
        let data = Dataset::from_failures(&[16.0, 34.0, 53.0, 75.0, 93.0, 120.0]).unwrap();
        let params = Weibull.mle(&data, &crate::solver::Newton::default()).unwrap();
        let ll = Weibull.log_likelihood(&params, &data);
        let prof = profile_log_likelihood(&Weibull, &data, &params, 1, params[1]);
        assert!((prof - ll).abs() < 1e-6, "{prof} vs {ll}");
        // Profiling can only raise the likelihood.
        let shifted = profile_log_likelihood(&Weibull, &data, &params, 1, params[1] * 1.2);
        let mut p = params.clone();
        p[1] *= 1.2;
        assert!(shifted >= Weibull.log_likelihood(&p, &data) - 1e-9);
    }
}
