//! Matched-filter detection and segmentation of stress-wave pulses.
//!
//! A [`PulseDetector`] holds an immutable [`DetectorConfig`] and the
//! half-sine [`WindowTemplate`] built from it. Typical usage:
//! ```ignore
//! let detector = PulseDetector::new(config)?;
//! let window = detector.find_window(signal, None, Some(4000), AmplitudeMetric::Peak)?;
//! let segment = detector.segment_and_center(signal, &window, 2048, 0.05)?;
//! ```

pub(crate) mod detector;
pub(crate) mod peaks;
pub(crate) mod rise_time;
pub(crate) mod segment;
pub(crate) mod template;

pub use detector::{AmplitudeMetric, DetectorConfig, PulseDetector};
pub use rise_time::calculate_rise_time;
pub use segment::segment_and_center;
pub use template::WindowTemplate;
