//! Dense row-major tensors for counts, energies and trajectories.
//!
//! The thermodynamic (ensemble) index is always the slowest varying dimension,
//! so `as_slice` exposes the same layout an external producer would hand over
//! as a flat buffer.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, TramError};

/// Number of thermodynamic states (ensembles) and Markov states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of ensembles `K`.
    pub n_therm_states: usize,
    /// Number of discrete Markov states `M`.
    pub n_markov_states: usize,
}

impl Dimensions {
    /// Creates a new dimension descriptor.
    pub const fn new(n_therm_states: usize, n_markov_states: usize) -> Self {
        Self {
            n_therm_states,
            n_markov_states,
        }
    }

    /// Number of `(K, i)` entries.
    pub const fn states(&self) -> usize {
        self.n_therm_states * self.n_markov_states
    }

    /// Number of `(K, i, j)` entries.
    pub const fn transitions(&self) -> usize {
        self.n_therm_states * self.n_markov_states * self.n_markov_states
    }
}

fn nested_dims<T>(rows: &[Vec<T>]) -> Result<usize, TramError> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    for (index, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(TramError::Input(
                ErrorInfo::new("ragged-rows", "nested rows must all have the same length")
                    .with_context("row", index.to_string())
                    .with_context("expected", width.to_string())
                    .with_context("actual", row.len().to_string()),
            ));
        }
    }
    Ok(width)
}

/// Real-valued `K × M` array such as `f_K_i`, `log_nu_K_i` or `log_R_K_i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateArray {
    dims: Dimensions,
    data: Vec<f64>,
}

impl StateArray {
    /// Creates an array with every entry set to `value`.
    pub fn filled(dims: Dimensions, value: f64) -> Self {
        Self {
            dims,
            data: vec![value; dims.states()],
        }
    }

    /// Creates a zero-initialised array.
    pub fn zeros(dims: Dimensions) -> Self {
        Self::filled(dims, 0.0)
    }

    /// Wraps a flat row-major buffer.
    pub fn from_vec(dims: Dimensions, data: Vec<f64>) -> Result<Self, TramError> {
        if data.len() != dims.states() {
            return Err(TramError::shape("state array", dims.states(), data.len()));
        }
        Ok(Self { dims, data })
    }

    /// Builds the array from one row per ensemble.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, TramError> {
        let width = nested_dims(&rows)?;
        let dims = Dimensions::new(rows.len(), width);
        Self::from_vec(dims, rows.into_iter().flatten().collect())
    }

    /// Shape of the array.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Values of ensemble `k` over all Markov states.
    pub fn row(&self, k: usize) -> &[f64] {
        let m = self.dims.n_markov_states;
        &self.data[k * m..(k + 1) * m]
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat row-major view.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Overwrites every entry with `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|entry| *entry = value);
    }

    /// Largest absolute entry-wise difference to `other`.
    ///
    /// Matching infinities count as no difference, so states that stay
    /// unobserved do not poison the result. Any NaN yields NaN.
    pub fn max_abs_difference(&self, other: &StateArray) -> f64 {
        let mut max = 0.0_f64;
        for (&a, &b) in self.data.iter().zip(other.data.iter()) {
            let delta = if a == b { 0.0 } else { (a - b).abs() };
            if delta.is_nan() {
                return f64::NAN;
            }
            max = max.max(delta);
        }
        max
    }

    /// Whether every entry is finite.
    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|value| value.is_finite())
    }
}

impl Index<(usize, usize)> for StateArray {
    type Output = f64;

    fn index(&self, (k, i): (usize, usize)) -> &f64 {
        &self.data[k * self.dims.n_markov_states + i]
    }
}

impl IndexMut<(usize, usize)> for StateArray {
    fn index_mut(&mut self, (k, i): (usize, usize)) -> &mut f64 {
        &mut self.data[k * self.dims.n_markov_states + i]
    }
}

/// Transition count tensor `C_K_ij`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCounts {
    dims: Dimensions,
    data: Vec<u32>,
}

impl TransitionCounts {
    /// Creates an all-zero count tensor.
    pub fn zeros(dims: Dimensions) -> Self {
        Self {
            dims,
            data: vec![0; dims.transitions()],
        }
    }

    /// Wraps a flat row-major buffer.
    pub fn from_vec(dims: Dimensions, data: Vec<u32>) -> Result<Self, TramError> {
        if data.len() != dims.transitions() {
            return Err(TramError::shape(
                "transition counts",
                dims.transitions(),
                data.len(),
            ));
        }
        Ok(Self { dims, data })
    }

    /// Builds the tensor from one square count matrix per ensemble.
    pub fn from_nested(matrices: Vec<Vec<Vec<u32>>>) -> Result<Self, TramError> {
        let n_markov_states = matrices.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(matrices.len() * n_markov_states * n_markov_states);
        for (k, matrix) in matrices.iter().enumerate() {
            if matrix.len() != n_markov_states || nested_dims(matrix)? != n_markov_states {
                return Err(TramError::Input(
                    ErrorInfo::new("non-square-counts", "count matrices must be M x M")
                        .with_context("ensemble", k.to_string())
                        .with_context("n_markov_states", n_markov_states.to_string()),
                ));
            }
            data.extend(matrix.iter().flatten().copied());
        }
        Self::from_vec(Dimensions::new(matrices.len(), n_markov_states), data)
    }

    /// Shape of the tensor.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    /// Total transitions out of `i` in ensemble `k`.
    pub fn row_sum(&self, k: usize, i: usize) -> u64 {
        let m = self.dims.n_markov_states;
        (0..m).map(|j| u64::from(self[(k, i, j)])).sum()
    }

    /// Transitions between `i` and `j` in either direction, `C_ij + C_ji`.
    pub fn symmetric_count(&self, k: usize, i: usize, j: usize) -> u64 {
        u64::from(self[(k, i, j)]) + u64::from(self[(k, j, i)])
    }

    /// Total transitions into `i` in ensemble `k`.
    pub fn column_sum(&self, k: usize, i: usize) -> u64 {
        let m = self.dims.n_markov_states;
        (0..m).map(|j| u64::from(self[(k, j, i)])).sum()
    }

    /// Visit counts taken as the row sums of every count matrix.
    ///
    /// Fails when a row sum does not fit the `u32` visit tensor.
    pub fn row_sums(&self) -> Result<VisitCounts, TramError> {
        let mut visits = VisitCounts::zeros(self.dims);
        for k in 0..self.dims.n_therm_states {
            for i in 0..self.dims.n_markov_states {
                let total = self.row_sum(k, i);
                visits[(k, i)] = u32::try_from(total).map_err(|_| {
                    TramError::Input(
                        ErrorInfo::new("visit-overflow", "row sum exceeds the visit count range")
                            .with_context("ensemble", k.to_string())
                            .with_context("state", i.to_string())
                            .with_context("row_sum", total.to_string()),
                    )
                })?;
            }
        }
        Ok(visits)
    }
}

impl Index<(usize, usize, usize)> for TransitionCounts {
    type Output = u32;

    fn index(&self, (k, i, j): (usize, usize, usize)) -> &u32 {
        let m = self.dims.n_markov_states;
        &self.data[(k * m + i) * m + j]
    }
}

impl IndexMut<(usize, usize, usize)> for TransitionCounts {
    fn index_mut(&mut self, (k, i, j): (usize, usize, usize)) -> &mut u32 {
        let m = self.dims.n_markov_states;
        &mut self.data[(k * m + i) * m + j]
    }
}

/// State visit tensor `N_K_i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitCounts {
    dims: Dimensions,
    data: Vec<u32>,
}

impl VisitCounts {
    /// Creates an all-zero visit tensor.
    pub fn zeros(dims: Dimensions) -> Self {
        Self {
            dims,
            data: vec![0; dims.states()],
        }
    }

    /// Wraps a flat row-major buffer.
    pub fn from_vec(dims: Dimensions, data: Vec<u32>) -> Result<Self, TramError> {
        if data.len() != dims.states() {
            return Err(TramError::shape("visit counts", dims.states(), data.len()));
        }
        Ok(Self { dims, data })
    }

    /// Builds the tensor from one row per ensemble.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, TramError> {
        let width = nested_dims(&rows)?;
        let dims = Dimensions::new(rows.len(), width);
        Self::from_vec(dims, rows.into_iter().flatten().collect())
    }

    /// Shape of the tensor.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }
}

impl Index<(usize, usize)> for VisitCounts {
    type Output = u32;

    fn index(&self, (k, i): (usize, usize)) -> &u32 {
        &self.data[k * self.dims.n_markov_states + i]
    }
}

impl IndexMut<(usize, usize)> for VisitCounts {
    fn index_mut(&mut self, (k, i): (usize, usize)) -> &mut u32 {
        &mut self.data[k * self.dims.n_markov_states + i]
    }
}

/// Discrete trajectory `M_x`: the Markov state of every frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSequence(Vec<usize>);

impl StateSequence {
    /// Wraps a list of state indices.
    pub fn new(states: Vec<usize>) -> Self {
        Self(states)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the trajectory is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// State indices in frame order.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Checks that every frame maps to one of `n_markov_states` states.
    pub fn validate(&self, n_markov_states: usize) -> Result<(), TramError> {
        match self.0.iter().position(|&state| state >= n_markov_states) {
            Some(frame) => Err(TramError::Input(
                ErrorInfo::new("state-out-of-range", "trajectory frame has an invalid state")
                    .with_context("frame", frame.to_string())
                    .with_context("state", self.0[frame].to_string())
                    .with_context("n_markov_states", n_markov_states.to_string()),
            )),
            None => Ok(()),
        }
    }

    /// Number of frames assigned to every state.
    pub fn histogram(&self, n_markov_states: usize) -> Vec<usize> {
        let mut counts = vec![0; n_markov_states];
        for &state in &self.0 {
            if let Some(slot) = counts.get_mut(state) {
                *slot += 1;
            }
        }
        counts
    }
}

/// Bias energy tensor `b_K_x` in reduced units, one row per ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasEnergies {
    n_therm_states: usize,
    seq_length: usize,
    data: Vec<f64>,
}

impl BiasEnergies {
    /// Creates an unbiased (all-zero) tensor.
    pub fn zeros(n_therm_states: usize, seq_length: usize) -> Self {
        Self {
            n_therm_states,
            seq_length,
            data: vec![0.0; n_therm_states * seq_length],
        }
    }

    /// Wraps a flat row-major buffer.
    pub fn from_vec(
        n_therm_states: usize,
        seq_length: usize,
        data: Vec<f64>,
    ) -> Result<Self, TramError> {
        if data.len() != n_therm_states * seq_length {
            return Err(TramError::shape(
                "bias energies",
                n_therm_states * seq_length,
                data.len(),
            ));
        }
        Ok(Self {
            n_therm_states,
            seq_length,
            data,
        })
    }

    /// Builds the tensor from one row of frame energies per ensemble.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, TramError> {
        let seq_length = nested_dims(&rows)?;
        Self::from_vec(rows.len(), seq_length, rows.into_iter().flatten().collect())
    }

    /// Expands state-wise biases `b_K_i` onto every frame of `sequence`.
    pub fn from_state_biases(
        b_k_i: &StateArray,
        sequence: &StateSequence,
    ) -> Result<Self, TramError> {
        let dims = b_k_i.dims();
        sequence.validate(dims.n_markov_states)?;
        let mut data = Vec::with_capacity(dims.n_therm_states * sequence.len());
        for k in 0..dims.n_therm_states {
            data.extend(sequence.as_slice().iter().map(|&i| b_k_i[(k, i)]));
        }
        Self::from_vec(dims.n_therm_states, sequence.len(), data)
    }

    /// Number of ensembles.
    pub fn n_therm_states(&self) -> usize {
        self.n_therm_states
    }

    /// Number of frames.
    pub fn seq_length(&self) -> usize {
        self.seq_length
    }
}

impl Index<(usize, usize)> for BiasEnergies {
    type Output = f64;

    fn index(&self, (k, x): (usize, usize)) -> &f64 {
        &self.data[k * self.seq_length + x]
    }
}
