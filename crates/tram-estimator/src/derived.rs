//! Observables derived from a converged `(log_nu_K_i, f_K_i)` pair.

use serde::{Deserialize, Serialize};
use tram_core::{logsumexp, Dimensions, ErrorInfo, StateArray, TramError, TransitionCounts};

use crate::kernel::pair_divisor;

/// Shifts `f_ground` so that `Σ_i exp(-f_ground_i) = 1` and applies the same
/// shift to every entry of `f_k_i`, keeping both on a common reference.
pub fn normalize_fki(f_ground: &mut [f64], f_k_i: &mut StateArray) {
    let negated: Vec<f64> = f_ground.iter().map(|value| -value).collect();
    let norm = logsumexp(&negated);
    f_ground.iter_mut().for_each(|value| *value += norm);
    f_k_i
        .as_mut_slice()
        .iter_mut()
        .for_each(|value| *value += norm);
}

/// Free energy of every thermodynamic state, `f_K = -ln Σ_i exp(-f_K_i)`.
pub fn therm_state_free_energies(f_k_i: &StateArray) -> Vec<f64> {
    let dims = f_k_i.dims();
    (0..dims.n_therm_states)
        .map(|k| {
            let negated: Vec<f64> = f_k_i.row(k).iter().map(|value| -value).collect();
            -logsumexp(&negated)
        })
        .collect()
}

/// Row-stochastic transition matrices `P_K_ij`, one per ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrices {
    dims: Dimensions,
    data: Vec<f64>,
}

impl TransitionMatrices {
    /// Builds the tensor from one square matrix per ensemble. Entries must be
    /// finite and non-negative; rows are used as sampling weights as given.
    pub fn from_nested(matrices: Vec<Vec<Vec<f64>>>) -> Result<Self, TramError> {
        let m = matrices.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(matrices.len() * m * m);
        for (k, matrix) in matrices.iter().enumerate() {
            if matrix.len() != m || matrix.iter().any(|row| row.len() != m) {
                return Err(TramError::Input(
                    ErrorInfo::new("non-square-matrix", "transition matrices must be M x M")
                        .with_context("ensemble", k.to_string())
                        .with_context("n_markov_states", m.to_string()),
                ));
            }
            for (i, row) in matrix.iter().enumerate() {
                if row.iter().any(|p| !(p.is_finite() && *p >= 0.0)) {
                    return Err(TramError::Input(
                        ErrorInfo::new("invalid-probability", "transition weights must be >= 0")
                            .with_context("ensemble", k.to_string())
                            .with_context("row", i.to_string()),
                    ));
                }
                data.extend_from_slice(row);
            }
        }
        Ok(Self {
            dims: Dimensions::new(matrices.len(), m),
            data,
        })
    }

    /// Shape of the tensor.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Transition probability from `i` to `j` in ensemble `k`.
    pub fn get(&self, k: usize, i: usize, j: usize) -> f64 {
        let m = self.dims.n_markov_states;
        self.data[(k * m + i) * m + j]
    }

    /// Outgoing probabilities of state `i` in ensemble `k`.
    pub fn row(&self, k: usize, i: usize) -> &[f64] {
        let m = self.dims.n_markov_states;
        &self.data[(k * m + i) * m..(k * m + i + 1) * m]
    }

    fn set(&mut self, k: usize, i: usize, j: usize, value: f64) {
        let m = self.dims.n_markov_states;
        self.data[(k * m + i) * m + j] = value;
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Reversible transition matrices implied by the auxiliary weights.
///
/// Off-diagonal entries follow `P_ij = C^sym_ij exp(-f_j - D_ij)`. Away from
/// the fixed point a row can exceed unit mass; in that case every off-diagonal
/// entry of the ensemble is scaled by the largest row sum, which preserves
/// detailed balance. The diagonal absorbs the remainder.
pub fn transition_matrices(
    log_nu: &StateArray,
    f_k_i: &StateArray,
    counts: &TransitionCounts,
) -> TransitionMatrices {
    let dims = counts.dims();
    let m = dims.n_markov_states;
    let mut matrices = TransitionMatrices {
        dims,
        data: vec![0.0; dims.transitions()],
    };
    for k in 0..dims.n_therm_states {
        let mut max_sum = 0.0_f64;
        for i in 0..m {
            let mut row_sum = 0.0;
            for j in 0..m {
                if i == j {
                    continue;
                }
                let c_sym = counts.symmetric_count(k, i, j);
                if c_sym == 0 {
                    continue;
                }
                let divisor = pair_divisor(log_nu, f_k_i, k, i, j);
                let value = ((c_sym as f64).ln() - f_k_i[(k, j)] - divisor).exp();
                matrices.set(k, i, j, value);
                row_sum += value;
            }
            max_sum = max_sum.max(row_sum);
        }
        let scale = if max_sum > 1.0 { max_sum.recip() } else { 1.0 };
        for i in 0..m {
            let mut off_diagonal = 0.0;
            for j in 0..m {
                if i != j {
                    let scaled = matrices.get(k, i, j) * scale;
                    matrices.set(k, i, j, scaled);
                    off_diagonal += scaled;
                }
            }
            matrices.set(k, i, i, 1.0 - off_diagonal);
        }
    }
    matrices
}
