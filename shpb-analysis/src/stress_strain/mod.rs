//! Stress, strain and strain rate of the specimen from an aligned pulse set.
//!
//! Three classical reductions are offered, see [`AnalysisMethod`]. Under
//! dynamic force equilibrium (`transmitted = incident + reflected` in the
//! signed convention used throughout the crate) all three agree, and the
//! [`EquilibriumMetrics`] quantify how far a test departs from that.

mod calculator;
mod curve;
mod equilibrium;
mod method;
mod setup;

pub use calculator::StressStrainCalculator;
pub use curve::StressStrainCurve;
pub use equilibrium::{EquilibriumMetrics, MetricSet, Phase, Quality, QualityAssessment};
pub use method::AnalysisMethod;
pub use setup::BarSetup;
