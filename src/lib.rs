pub mod acoustics;
pub mod annotation;
pub mod audio;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod types;

pub use acoustics::{AcousticEngine, PraatEngine};
pub use config::CorpusConfig;
pub use corpus::{run_corpus_pass, CorpusTable};
pub use error::{ExtractionError, Result};
pub use features::SegmentAnalyzer;
