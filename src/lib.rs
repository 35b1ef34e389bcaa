pub mod extractor;
pub mod fetcher;
pub mod input_loader;
pub mod logger;
pub mod pipeline;
pub mod report;
pub mod search;

// Exporting types for convenience
pub use extractor::EmailExtractor;
pub use fetcher::PageFetcher;
pub use input_loader::{EntityRecord, InputError};
pub use pipeline::{EntityResult, Pipeline, DEFAULT_PACING, NOT_FOUND};
pub use report::{domain_tally, summarize, BatchSummary, DomainTally};
pub use search::{SearchConfig, SearchEngine, Selection};
