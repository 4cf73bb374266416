//! Fixed-point update equations of the TRAM estimator.
//!
//! Every operation reads from shared references and writes into a separate
//! `&mut` output, which is what keeps the old and new iterates apart: entries
//! of `log_nu` and `f` are read several times per `(K, i, j)` triple, so an
//! in-place update would mix two iterations. The caller swaps buffers between
//! calls. Nothing here decides convergence, validates input or logs.

use tram_core::{
    logsumexp, logsumexp_pair, BiasEnergies, Dimensions, StateArray, StateSequence,
    TransitionCounts, VisitCounts,
};

/// Pseudo-count added to diagonal counts before taking logarithms.
pub const PRIOR: f64 = 1.0e-10;

/// `ln(PRIOR)`, used for diagonal cells without counts.
pub const LOG_PRIOR: f64 = -23.025_850_929_940_457;

/// Call-scoped scratch space for log-sum-exp accumulation.
///
/// Contents are overwritten by every call, so one instance can be reused
/// across iterations without carrying state between them.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    state: Vec<f64>,
    therm: Vec<f64>,
}

impl Scratch {
    /// Allocates scratch buffers for the given problem size.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            state: vec![0.0; dims.n_markov_states],
            therm: vec![0.0; dims.n_therm_states],
        }
    }

    fn fit(&mut self, dims: Dimensions) {
        if self.state.len() < dims.n_markov_states {
            self.state.resize(dims.n_markov_states, 0.0);
        }
        if self.therm.len() < dims.n_therm_states {
            self.therm.resize(dims.n_therm_states, 0.0);
        }
    }
}

fn log_diagonal(count: u32) -> f64 {
    if count == 0 {
        LOG_PRIOR
    } else {
        (PRIOR + f64::from(count)).ln()
    }
}

/// Log of the symmetrised rate denominator `nu_j e^{-f_i} + nu_i e^{-f_j}`.
#[inline]
pub(crate) fn pair_divisor(
    log_nu: &StateArray,
    f: &StateArray,
    k: usize,
    i: usize,
    j: usize,
) -> f64 {
    logsumexp_pair(log_nu[(k, j)] - f[(k, i)], log_nu[(k, i)] - f[(k, j)])
}

/// Initial auxiliary weights `log_nu_K_i = ln(PRIOR + Σ_j C_K_ij)`.
pub fn set_lognu(counts: &TransitionCounts, log_nu: &mut StateArray) {
    let dims = counts.dims();
    debug_assert_eq!(log_nu.dims(), dims);
    for k in 0..dims.n_therm_states {
        for i in 0..dims.n_markov_states {
            log_nu[(k, i)] = (PRIOR + counts.row_sum(k, i) as f64).ln();
        }
    }
}

/// One fixed-point update of the auxiliary weights `log_nu_K_i`.
pub fn iterate_lognu(
    log_nu: &StateArray,
    f: &StateArray,
    counts: &TransitionCounts,
    scratch: &mut Scratch,
    new_log_nu: &mut StateArray,
) {
    let dims = counts.dims();
    debug_assert_eq!(log_nu.dims(), dims);
    debug_assert_eq!(f.dims(), dims);
    debug_assert_eq!(new_log_nu.dims(), dims);
    scratch.fit(dims);
    let m = dims.n_markov_states;
    for k in 0..dims.n_therm_states {
        for i in 0..m {
            let mut o = 0;
            for j in 0..m {
                let c_ij = counts[(k, i, j)];
                if i == j {
                    scratch.state[o] = log_diagonal(c_ij);
                    o += 1;
                    continue;
                }
                let c_sym = counts.symmetric_count(k, i, j);
                if c_sym == 0 {
                    continue;
                }
                let divisor = pair_divisor(log_nu, f, k, i, j);
                scratch.state[o] = (c_sym as f64).ln() + log_nu[(k, i)] - f[(k, j)] - divisor;
                o += 1;
            }
            new_log_nu[(k, i)] = logsumexp(&scratch.state[..o]);
        }
    }
}

/// Computes the per-state reweighting factors `log_R_K_i` (step one of the
/// free-energy update).
pub fn compute_log_r(
    log_nu: &StateArray,
    f: &StateArray,
    counts: &TransitionCounts,
    visits: &VisitCounts,
    scratch: &mut Scratch,
    log_r: &mut StateArray,
) {
    let dims = counts.dims();
    debug_assert_eq!(visits.dims(), dims);
    debug_assert_eq!(log_r.dims(), dims);
    scratch.fit(dims);
    let m = dims.n_markov_states;
    for k in 0..dims.n_therm_states {
        for i in 0..m {
            let mut incoming: i64 = 0;
            let mut o = 0;
            for j in 0..m {
                let c_ij = counts[(k, i, j)];
                let c_ji = counts[(k, j, i)];
                incoming += i64::from(c_ji);
                if i == j {
                    scratch.state[o] = log_diagonal(c_ij) + f[(k, i)];
                    o += 1;
                    continue;
                }
                let c_sym = counts.symmetric_count(k, i, j);
                if c_sym == 0 {
                    continue;
                }
                let divisor = pair_divisor(log_nu, f, k, i, j);
                scratch.state[o] = (c_sym as f64).ln() + log_nu[(k, j)] - divisor;
                o += 1;
            }
            // visits not preceded by a counted transition, e.g. trajectory starts
            let unexplained = i64::from(visits[(k, i)]) - incoming;
            let addon = if unexplained > 0 {
                (unexplained as f64).ln() + f[(k, i)]
            } else {
                f64::NEG_INFINITY
            };
            log_r[(k, i)] = logsumexp_pair(logsumexp(&scratch.state[..o]), addon);
        }
    }
}

/// Accumulates `-ln Σ_x exp(-(divisor_x + b_K_x))` per `(K, M_x)` into `out`,
/// which must hold `+inf` (zero mass) on entry.
fn accumulate_trajectory(
    bias: &BiasEnergies,
    sequence: &StateSequence,
    log_r: &StateArray,
    therm: &mut [f64],
    out: &mut StateArray,
) {
    let n_therm_states = log_r.dims().n_therm_states;
    for (x, &i) in sequence.as_slice().iter().enumerate() {
        for (k, slot) in therm.iter_mut().enumerate().take(n_therm_states) {
            *slot = log_r[(k, i)] - bias[(k, x)];
        }
        let divisor = logsumexp(&therm[..n_therm_states]);
        for k in 0..n_therm_states {
            out[(k, i)] = -logsumexp_pair(-out[(k, i)], -(divisor + bias[(k, x)]));
        }
    }
}

/// One fixed-point update of the free energies `f_K_i`.
///
/// Writes the intermediate `log_R_K_i` into `log_r` as a byproduct and the
/// new free energies, normalised so that `Σ_i exp(-f[target][i]) = 1`, into
/// `new_f`. States that never occur in `sequence` keep `+inf`.
#[allow(clippy::too_many_arguments)]
pub fn iterate_fki(
    log_nu: &StateArray,
    f: &StateArray,
    counts: &TransitionCounts,
    bias: &BiasEnergies,
    sequence: &StateSequence,
    visits: &VisitCounts,
    target: usize,
    log_r: &mut StateArray,
    scratch: &mut Scratch,
    new_f: &mut StateArray,
) {
    let dims = counts.dims();
    debug_assert_eq!(new_f.dims(), dims);
    debug_assert_eq!(bias.n_therm_states(), dims.n_therm_states);
    debug_assert_eq!(bias.seq_length(), sequence.len());
    debug_assert!(target < dims.n_therm_states);
    compute_log_r(log_nu, f, counts, visits, scratch, log_r);

    new_f.fill(f64::INFINITY);
    accumulate_trajectory(bias, sequence, log_r, &mut scratch.therm, new_f);

    let m = dims.n_markov_states;
    for i in 0..m {
        scratch.state[i] = -new_f[(target, i)];
    }
    let norm = logsumexp(&scratch.state[..m]);
    new_f.as_mut_slice().iter_mut().for_each(|value| *value += norm);
}

/// Bias-free free energies `f_i` marginalised over all ensembles, normalised so
/// that `Σ_i exp(-f_i) = 1`.
///
/// `f_ground` has one entry per Markov state; `log_r` is the array produced by
/// the last [`iterate_fki`] call.
pub fn f_ground_state(
    bias: &BiasEnergies,
    sequence: &StateSequence,
    log_r: &StateArray,
    scratch: &mut Scratch,
    f_ground: &mut [f64],
) {
    let dims = log_r.dims();
    debug_assert_eq!(f_ground.len(), dims.n_markov_states);
    scratch.fit(dims);
    let n_therm_states = dims.n_therm_states;
    f_ground.iter_mut().for_each(|value| *value = f64::INFINITY);
    for (x, &i) in sequence.as_slice().iter().enumerate() {
        for k in 0..n_therm_states {
            scratch.therm[k] = log_r[(k, i)] - bias[(k, x)];
        }
        let divisor = logsumexp(&scratch.therm[..n_therm_states]);
        f_ground[i] = -logsumexp_pair(-f_ground[i], -divisor);
    }
    for (slot, &value) in scratch.state.iter_mut().zip(f_ground.iter()) {
        *slot = -value;
    }
    let norm = logsumexp(&scratch.state[..dims.n_markov_states]);
    f_ground.iter_mut().for_each(|value| *value += norm);
}
