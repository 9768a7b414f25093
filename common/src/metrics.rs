use metrics::{describe_counter, describe_histogram};

pub mod names {
    use const_format::concatcp;

    pub const METRIC_NAME_PREFIX: &str = "shpb_analysis_";

    pub const DETECTIONS: &str = concatcp!(METRIC_NAME_PREFIX, "detections");
    pub const DETECTION_FAILURES: &str = concatcp!(METRIC_NAME_PREFIX, "detection_failures");
    pub const DETECTION_RETRIES: &str = concatcp!(METRIC_NAME_PREFIX, "detection_retries");
    pub const FITNESS_EVALUATIONS: &str = concatcp!(METRIC_NAME_PREFIX, "fitness_evaluations");
    pub const DEGENERATE_FITNESS: &str = concatcp!(METRIC_NAME_PREFIX, "degenerate_fitness");
    pub const ALIGNMENT_GENERATIONS: &str =
        concatcp!(METRIC_NAME_PREFIX, "alignment_generations");
}

pub mod detection_failures {
    #[derive(Debug, Clone, Eq, Hash, PartialEq)]
    pub enum FailureKind {
        NoWindow,
        ThresholdNotCrossed,
        RetriesExhausted,
    }

    // Label building function
    pub fn get_label(failure_kind: FailureKind) -> (&'static str, &'static str) {
        (
            "failure_kind",
            match failure_kind {
                FailureKind::NoWindow => "no_window",
                FailureKind::ThresholdNotCrossed => "threshold_not_crossed",
                FailureKind::RetriesExhausted => "retries_exhausted",
            },
        )
    }
}

/// Registers descriptions for every metric emitted by the analysis crates.
/// Harmless when no recorder is installed.
pub fn describe_metrics() {
    describe_counter!(names::DETECTIONS, "Pulse windows successfully located");
    describe_counter!(
        names::DETECTION_FAILURES,
        "Pulse detections that found no admissible window"
    );
    describe_counter!(
        names::DETECTION_RETRIES,
        "Detection attempts repeated with a widened search margin"
    );
    describe_counter!(
        names::FITNESS_EVALUATIONS,
        "Alignment fitness function evaluations"
    );
    describe_counter!(
        names::DEGENERATE_FITNESS,
        "Alignment fitness evaluations replaced by the penalty value"
    );
    describe_histogram!(
        names::ALIGNMENT_GENERATIONS,
        "Optimiser generations used per alignment"
    );
}
