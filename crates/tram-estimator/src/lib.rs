#![deny(missing_docs)]

//! Transition-based reweighting analysis (TRAM) estimator.
//!
//! [`kernel`] holds the self-consistent update equations and is usable on its
//! own by a caller that owns the iteration loop. [`driver::estimate`] is that
//! loop: it validates the data, alternates the updates until the free
//! energies stop moving and derives the bias-free distribution, ensemble
//! free energies and transition matrices.

/// Estimator configuration and YAML loading.
pub mod config;
/// Derived observables: normalisation, ensemble free energies, transition matrices.
pub mod derived;
/// Outer self-consistent iteration.
pub mod driver;
/// Fixed-point update equations.
pub mod kernel;
/// Synthetic chain sampling.
pub mod synthetic;

pub use config::EstimatorConfig;
pub use derived::{
    normalize_fki, therm_state_free_energies, transition_matrices, TransitionMatrices,
};
pub use driver::{estimate, TramData, TramEstimate};
pub use kernel::{
    compute_log_r, f_ground_state, iterate_fki, iterate_lognu, set_lognu, Scratch, LOG_PRIOR, PRIOR,
};
pub use synthetic::{draw_transition_counts, tower_sample, SampledChains};
