#![allow(dead_code)]

use tram_core::{BiasEnergies, StateArray, StateSequence, TransitionCounts, VisitCounts};
use tram_estimator::{draw_transition_counts, TramData, TransitionMatrices};

/// Reduced energies of the three-state reference model.
pub const ENERGY: [f64; 3] = [1.0, 2.0, 0.0];

/// Two-ensemble, two-state data used by the single-step checks.
pub fn two_state_counts() -> TransitionCounts {
    TransitionCounts::from_nested(vec![
        vec![vec![5, 2], vec![1, 3]],
        vec![vec![4, 1], vec![2, 2]],
    ])
    .unwrap()
}

/// Trajectory whose per-state frame totals match the pooled visit counts (12 and 8).
pub fn two_state_sequence() -> StateSequence {
    let mut states = Vec::new();
    for _ in 0..4 {
        states.extend([0, 0, 1, 0, 1]);
    }
    StateSequence::new(states)
}

/// Exact free energies `f_i` of the reference model, normalised to unit mass.
pub fn reference_f_i() -> Vec<f64> {
    let z: f64 = ENERGY.iter().map(|e| (-e).exp()).sum();
    ENERGY.iter().map(|e| e + z.ln()).collect()
}

/// State biases `b_K_i`: unbiased plus a flattening bias `2 - E`.
pub fn reference_bias() -> StateArray {
    StateArray::from_rows(vec![vec![0.0; 3], ENERGY.iter().map(|e| 2.0 - e).collect()]).unwrap()
}

/// Metropolis chain on `ENERGY` plus a uniform random walk.
pub fn reference_matrices() -> TransitionMatrices {
    let selection = vec![
        vec![0.5, 0.5, 0.0],
        vec![0.5, 0.0, 0.5],
        vec![0.0, 0.5, 0.5],
    ];
    let mut metropolis = vec![vec![0.0; 3]; 3];
    for i in 0..3 {
        let mut off_diagonal = 0.0;
        for j in 0..3 {
            if i != j {
                let delta = (ENERGY[j] - ENERGY[i]).max(0.0);
                metropolis[i][j] = selection[i][j] * (-delta).exp();
                off_diagonal += metropolis[i][j];
            }
        }
        metropolis[i][i] = 1.0 - off_diagonal;
    }
    TransitionMatrices::from_nested(vec![metropolis, selection]).unwrap()
}

/// Sampled data for the reference model.
pub fn reference_data(n_samples: usize, seed: u64) -> TramData {
    let chains = draw_transition_counts(&reference_matrices(), n_samples, 0, seed).unwrap();
    let bias = BiasEnergies::from_state_biases(&reference_bias(), &chains.sequence).unwrap();
    TramData::new(chains.counts, chains.visits, bias, chains.sequence).unwrap()
}

pub fn zero_bias(n_therm_states: usize, sequence: &StateSequence) -> BiasEnergies {
    BiasEnergies::zeros(n_therm_states, sequence.len())
}

pub fn visits_from_rows(counts: &TransitionCounts) -> VisitCounts {
    counts.row_sums().unwrap()
}

pub fn probability_mass(f: &[f64]) -> f64 {
    f.iter().map(|value| (-value).exp()).sum()
}
