//! Praat TextGrid annotations.

mod textgrid;

pub use textgrid::TextGrid;

/// A labelled time span on an interval tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Interval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_labelled(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A labelled instant on a point tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub time: f64,
    pub mark: String,
}

/// One tier, its shape decided when the file is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationTier {
    Interval { name: String, intervals: Vec<Interval> },
    Point { name: String, points: Vec<Point> },
}

impl AnnotationTier {
    pub fn name(&self) -> &str {
        match self {
            AnnotationTier::Interval { name, .. } | AnnotationTier::Point { name, .. } => name,
        }
    }

    pub fn is_point_tier(&self) -> bool {
        matches!(self, AnnotationTier::Point { .. })
    }

    /// Intervals in tier order; empty for a point tier.
    pub fn intervals(&self) -> &[Interval] {
        match self {
            AnnotationTier::Interval { intervals, .. } => intervals,
            AnnotationTier::Point { .. } => &[],
        }
    }

    /// Points in tier order; empty for an interval tier.
    pub fn points(&self) -> &[Point] {
        match self {
            AnnotationTier::Point { points, .. } => points,
            AnnotationTier::Interval { .. } => &[],
        }
    }
}
