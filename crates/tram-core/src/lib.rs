#![deny(missing_docs)]
#![doc = "Core data model and numerical primitives shared by the TRAM estimator crates."]

pub mod arrays;
pub mod errors;
pub mod lse;
pub mod rng;

pub use arrays::{
    BiasEnergies, Dimensions, StateArray, StateSequence, TransitionCounts, VisitCounts,
};
pub use errors::{ErrorInfo, TramError};
pub use lse::{logsumexp, logsumexp_pair};
pub use rng::{derive_substream_seed, RngHandle};
