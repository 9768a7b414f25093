//! This crate provides tools for converting the strain-gauge traces of a
//! Split-Hopkinson Pressure Bar test into stress-strain curves.
//!
//! A typical analysis runs the following stages:
//! ```text
//! raw trace
//!     -> PulseDetector::find_window         // matched filter locates each pulse
//!     -> PulseDetector::segment_and_center  // fixed-length, centred, de-noised segment
//!     -> PulseAligner::align                // integer shifts maximising equilibrium
//!     -> StressStrainCalculator::calculate  // 1-, 2- and 3-wave curves and metrics
//! ```
//! The [`pipeline::Pipeline`] type runs all of these stages for the three
//! pulse roles of a test.

pub mod alignment;
pub mod error;
pub mod numeric;
pub mod pipeline;
pub mod pulse_detection;
pub mod signal;
pub mod stress_strain;
pub mod taper;

pub use alignment::{
    AlignerConfig, AlignmentResult, Cancellation, EquilibriumCriteria, OptimiserConfig,
    PulseAligner, ShiftBounds,
};
pub use error::{
    AlignmentError, AnalysisError, DetectionError, PipelineError, ValidationError,
};
pub use pipeline::{AnalysisReport, BarSignals, Pipeline, PipelineConfig};
pub use pulse_detection::{AmplitudeMetric, DetectorConfig, PulseDetector, WindowTemplate};
pub use signal::{PulseSet, PulseWindow, RawSignal};
pub use stress_strain::{
    AnalysisMethod, BarSetup, EquilibriumMetrics, StressStrainCalculator, StressStrainCurve,
};
pub use taper::TaperWindow;

pub use shpb_common::{Polarity, PulseRole, Real};
