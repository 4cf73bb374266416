use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tram_core::{
    BiasEnergies, Dimensions, ErrorInfo, StateArray, StateSequence, TramError, TransitionCounts,
    VisitCounts,
};

use crate::config::EstimatorConfig;
use crate::derived::{self, TransitionMatrices};
use crate::kernel::{self, Scratch};

/// Validated input bundle for a TRAM estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TramData {
    counts: TransitionCounts,
    visits: VisitCounts,
    bias: BiasEnergies,
    sequence: StateSequence,
}

impl TramData {
    /// Checks that all tensors agree on `K`, `M` and the trajectory length.
    pub fn new(
        counts: TransitionCounts,
        visits: VisitCounts,
        bias: BiasEnergies,
        sequence: StateSequence,
    ) -> Result<Self, TramError> {
        let dims = counts.dims();
        if visits.dims() != dims {
            return Err(TramError::Input(
                ErrorInfo::new("visit-shape", "visit counts do not match the count tensor")
                    .with_context("counts", format!("{dims:?}"))
                    .with_context("visits", format!("{:?}", visits.dims())),
            ));
        }
        if bias.n_therm_states() != dims.n_therm_states {
            return Err(TramError::shape(
                "bias ensembles",
                dims.n_therm_states,
                bias.n_therm_states(),
            ));
        }
        if bias.seq_length() != sequence.len() {
            return Err(TramError::shape(
                "bias frames",
                sequence.len(),
                bias.seq_length(),
            ));
        }
        sequence.validate(dims.n_markov_states)?;
        Ok(Self {
            counts,
            visits,
            bias,
            sequence,
        })
    }

    /// Problem dimensions.
    pub fn dims(&self) -> Dimensions {
        self.counts.dims()
    }

    /// Transition counts `C_K_ij`.
    pub fn counts(&self) -> &TransitionCounts {
        &self.counts
    }

    /// Visit counts `N_K_i`.
    pub fn visits(&self) -> &VisitCounts {
        &self.visits
    }

    /// Frame bias energies `b_K_x`.
    pub fn bias(&self) -> &BiasEnergies {
        &self.bias
    }

    /// Discrete trajectory `M_x`.
    pub fn sequence(&self) -> &StateSequence {
        &self.sequence
    }
}

/// Result of a full estimator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TramEstimate {
    /// Free energies per `(ensemble, state)`, on the same reference as `f_i`.
    pub f_k_i: StateArray,
    /// Bias-free free energies per Markov state, `Σ exp(-f_i) = 1`.
    pub f_i: Vec<f64>,
    /// Free energy of each ensemble.
    pub f_k: Vec<f64>,
    /// Final auxiliary weights.
    pub log_nu_k_i: StateArray,
    /// Reweighting factors from the last free-energy update.
    pub log_r_k_i: StateArray,
    /// Reversible transition matrices per ensemble.
    pub transition_matrices: TransitionMatrices,
    /// Number of update pairs performed.
    pub iterations: usize,
    /// Whether the increment dropped below `ftol`.
    pub converged: bool,
    /// Largest `f_K_i` change after every iteration.
    pub increments: Vec<f64>,
}

/// Runs the self-consistent iteration to convergence and derives all observables.
pub fn estimate(config: &EstimatorConfig, data: &TramData) -> Result<TramEstimate, TramError> {
    let dims = data.dims();
    if config.target_ensemble >= dims.n_therm_states {
        return Err(TramError::Input(
            ErrorInfo::new("target-out-of-range", "target ensemble does not exist")
                .with_context("target_ensemble", config.target_ensemble.to_string())
                .with_context("n_therm_states", dims.n_therm_states.to_string())
                .with_hint("target_ensemble is zero-based"),
        ));
    }

    let mut scratch = Scratch::new(dims);
    let mut log_nu = StateArray::zeros(dims);
    let mut new_log_nu = StateArray::zeros(dims);
    let mut f = StateArray::zeros(dims);
    let mut new_f = StateArray::zeros(dims);
    let mut log_r = StateArray::zeros(dims);
    kernel::set_lognu(data.counts(), &mut log_nu);

    let mut increments = Vec::new();
    let mut converged = false;
    for iteration in 0..config.max_iter {
        kernel::iterate_lognu(&log_nu, &f, data.counts(), &mut scratch, &mut new_log_nu);
        kernel::iterate_fki(
            &new_log_nu,
            &f,
            data.counts(),
            data.bias(),
            data.sequence(),
            data.visits(),
            config.target_ensemble,
            &mut log_r,
            &mut scratch,
            &mut new_f,
        );
        let increment = new_f.max_abs_difference(&f);
        std::mem::swap(&mut log_nu, &mut new_log_nu);
        std::mem::swap(&mut f, &mut new_f);
        increments.push(increment);

        if increment.is_nan() {
            return Err(TramError::Numerical(
                ErrorInfo::new("nan-increment", "free energies became NaN")
                    .with_context("iteration", iteration.to_string())
                    .with_hint("check for states with transition counts but no visits"),
            ));
        }
        if config.log_interval > 0 && iteration % config.log_interval == 0 {
            debug!(iteration, increment, "tram iteration");
        }
        if increment < config.ftol {
            converged = true;
            info!(iterations = iteration + 1, increment, "tram converged");
            break;
        }
    }
    if !converged {
        warn!(
            max_iter = config.max_iter,
            increment = increments.last().copied().unwrap_or(f64::NAN),
            "tram did not converge"
        );
    }

    let mut f_i = vec![0.0; dims.n_markov_states];
    kernel::f_ground_state(data.bias(), data.sequence(), &log_r, &mut scratch, &mut f_i);
    derived::normalize_fki(&mut f_i, &mut f);
    let f_k = derived::therm_state_free_energies(&f);
    let transition_matrices = derived::transition_matrices(&log_nu, &f, data.counts());

    Ok(TramEstimate {
        f_k_i: f,
        f_i,
        f_k,
        log_nu_k_i: log_nu,
        log_r_k_i: log_r,
        transition_matrices,
        iterations: increments.len(),
        converged,
        increments,
    })
}
