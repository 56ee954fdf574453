use thiserror::Error;

/// Convenient alias for results returned by the extraction pipeline.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Reasons a measurement group (or a whole segment) could not be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("segment of {duration:.4}s is shorter than the {minimum:.4}s required")]
    SegmentTooShort { duration: f64, minimum: f64 },

    #[error("segment of {duration:.4}s is longer than the {maximum:.4}s allowed")]
    SegmentTooLong { duration: f64, maximum: f64 },

    #[error("analysis window of {window:.4}s does not fit in {duration:.4}s of audio")]
    AnalysisWindowMismatch { window: f64, duration: f64 },

    #[error("no valid frames for {0}")]
    NoValidFrames(&'static str),

    #[error("landmark '{0}' not found near its anchor")]
    LandmarkUnmatched(&'static str),

    #[error("interval [{start:.4}, {end:.4}] selects no samples")]
    EmptySegment { start: f64, end: f64 },

    #[error("interval [{start:.4}, {end:.4}] is not a valid time range")]
    InvalidInterval { start: f64, end: f64 },

    #[error("segment time budget exhausted after {elapsed_ms} ms")]
    BudgetExceeded { elapsed_ms: u128 },
}
