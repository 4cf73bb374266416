//! Synthetic multi-ensemble Markov-chain data for tests, benchmarks and demos.

use tram_core::{
    Dimensions, ErrorInfo, RngHandle, StateSequence, TramError, TransitionCounts, VisitCounts,
};

use crate::derived::TransitionMatrices;

/// Draws an index with probability proportional to `weights` (inverse CDF).
pub fn tower_sample(weights: &[f64], rng: &mut RngHandle) -> usize {
    let total: f64 = weights.iter().sum();
    let threshold = rng.uniform() * total;
    let mut cumulative = 0.0;
    for (index, &weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative > threshold {
            return index;
        }
    }
    // rounding can leave the threshold at the very top of the CDF
    weights
        .iter()
        .rposition(|&weight| weight > 0.0)
        .unwrap_or(0)
}

/// Counts and trajectory sampled from one chain per ensemble.
#[derive(Debug, Clone)]
pub struct SampledChains {
    /// Transition counts `C_K_ij`.
    pub counts: TransitionCounts,
    /// Visits `N_K_i`, including each chain's starting frame.
    pub visits: VisitCounts,
    /// All chains concatenated in ensemble order.
    pub sequence: StateSequence,
}

/// Samples `n_samples` transitions in every ensemble, starting each chain at `start`.
///
/// Ensemble `K` draws from substream `K` of `master_seed`.
pub fn draw_transition_counts(
    matrices: &TransitionMatrices,
    n_samples: usize,
    start: usize,
    master_seed: u64,
) -> Result<SampledChains, TramError> {
    let dims: Dimensions = matrices.dims();
    if start >= dims.n_markov_states {
        return Err(TramError::Input(
            ErrorInfo::new("start-out-of-range", "chain start state does not exist")
                .with_context("start", start.to_string())
                .with_context("n_markov_states", dims.n_markov_states.to_string()),
        ));
    }
    let mut counts = TransitionCounts::zeros(dims);
    let mut visits = VisitCounts::zeros(dims);
    let mut states = Vec::with_capacity(dims.n_therm_states * (n_samples + 1));
    for k in 0..dims.n_therm_states {
        let mut rng = RngHandle::substream(master_seed, k as u64);
        let mut x = start;
        visits[(k, x)] += 1;
        states.push(x);
        for _ in 0..n_samples {
            let next = tower_sample(matrices.row(k, x), &mut rng);
            counts[(k, x, next)] += 1;
            x = next;
            visits[(k, x)] += 1;
            states.push(x);
        }
    }
    Ok(SampledChains {
        counts,
        visits,
        sequence: StateSequence::new(states),
    })
}
