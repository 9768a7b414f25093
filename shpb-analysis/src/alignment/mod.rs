//! Integer-shift alignment of the transmitted and reflected pulses onto the
//! incident pulse.
//!
//! The shifts are chosen to maximise a weighted blend of four equilibrium
//! criteria evaluated over the linear region of the incident loading edge.
//! The search is a seeded differential evolution over the two-dimensional
//! shift space, followed by an integer polish.

mod aligner;
mod cancellation;
mod criteria;
mod fitness;
mod linear_region;
mod optimiser;

pub use aligner::{AlignerConfig, AlignmentResult, PulseAligner, ShiftBounds};
pub use cancellation::Cancellation;
pub use criteria::EquilibriumCriteria;
pub use fitness::{FitnessBreakdown, PENALTY};
pub use linear_region::linear_region;
pub use optimiser::{OptimiserConfig, OptimiserOutcome};
