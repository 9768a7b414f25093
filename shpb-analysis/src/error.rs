use shpb_common::{PulseRole, Real};
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Length Mismatch: {name} has {actual} samples, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Empty Input: {0}")]
    Empty(&'static str),
    #[error("{name} must be {requirement}, got {value}")]
    OutOfRange {
        name: &'static str,
        requirement: &'static str,
        value: Real,
    },
    #[error("Invalid Pulse Window [{start}, {end}) for a signal of {len} samples")]
    InvalidWindow { start: usize, end: usize, len: usize },
    #[error("Invalid Bounds for {name}: lower {lower} exceeds upper {upper}")]
    InvertedBounds {
        name: &'static str,
        lower: i64,
        upper: i64,
    },
    #[error("Unknown Analysis Method: {0}")]
    UnknownMethod(String),
    #[error("Sample Interval Mismatch: {first} and {second}")]
    SampleIntervalMismatch { first: Real, second: Real },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectionError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error(
        "No Pulse Window found after {trials} threshold trial(s) within bounds [{lower:?}, {upper:?}]"
    )]
    NoWindow {
        trials: usize,
        lower: Option<usize>,
        upper: Option<usize>,
    },
    #[error("Pulse never crosses {fraction} of its peak value")]
    ThresholdNotCrossed { fraction: Real },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Alignment cancelled after {generations} generation(s)")]
    Cancelled { generations: usize },
    #[error("Alignment deadline exceeded after {generations} generation(s)")]
    DeadlineExceeded { generations: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{role} pulse: {source}")]
    Detection {
        role: PulseRole,
        source: DetectionError,
    },
    #[error("{role} pulse extraction exhausted after {attempts} attempt(s)")]
    ExtractionExhausted { role: PulseRole, attempts: usize },
    #[error("{0}")]
    Alignment(#[from] AlignmentError),
}

/// Any error raised by the analysis stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Detection(#[from] DetectionError),
    #[error("{0}")]
    Alignment(#[from] AlignmentError),
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
}
